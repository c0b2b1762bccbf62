/*!
This module handles the round state machine: spawning, player commands,
bottom-touch locking, cascading line clears, scoring and the gravity pump.
*/

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;

use super::*;

/// Resting pivot for a piece that could not enter the field.
const BLOCKED_SPAWN_PIVOT: Coord = (-5, -5);

/// Pivot at which the preview template is parked.
const PREVIEW_PIVOT: Coord = (2, 2);

impl Game {
    // ---- player commands ----------------------------------------------

    /// Moves every active piece by `(dx, dy)`, all or nothing.
    ///
    /// A downward step (`dy > 0`) first runs bottom-touch detection over all
    /// active pieces, which may lock pieces and clear lines as a side effect.
    /// The translation is then validated for every remaining active piece
    /// against all cells except its own; if any piece fails, nothing moves.
    /// On success one replacement piece is spawned per piece locked by the
    /// bottom-touch check.
    ///
    /// Returns whether the translation was applied. A rejected no-op when the
    /// round is not running.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> bool {
        if !self.is_running() {
            return false;
        }
        let mut replacements = 0;
        if dy > 0 {
            replacements = self.lock_landed();
        }
        for (index, piece) in self.active.iter().enumerate() {
            let (px, py) = piece.pivot();
            let obstacles = self.obstacles_excluding(index);
            if !self
                .rules
                .admits((px + dx, py + dy), &piece.shape(), &obstacles, self.config.field_size)
            {
                return false;
            }
        }
        let moved = !self.active.is_empty();
        for piece in &mut self.active {
            let (px, py) = piece.pivot();
            piece.recenter((px + dx, py + dy));
        }
        if moved {
            self.notifier.mark();
        }
        for _ in 0..replacements {
            self.spawn_active();
        }
        true
    }

    /// Rotates each active piece to the next clockwise state of its family,
    /// independently per piece: a `false` entry leaves that piece unchanged
    /// and never blocks another piece's rotation.
    ///
    /// Returns the empty list when the round is not running.
    pub fn rotate(&mut self) -> Vec<bool> {
        if !self.is_running() {
            return Vec::new();
        }
        let mut results = Vec::with_capacity(self.active.len());
        for index in 0..self.active.len() {
            let piece = &self.active[index];
            // Active pieces always carry catalog shapes; anything else is a
            // collaborator bug.
            let next = self
                .catalog
                .successor(&piece.shape())
                .expect("active piece shape not found in the catalog");
            let obstacles = self.obstacles_excluding(index);
            let legal = self
                .rules
                .admits(piece.pivot(), &next, &obstacles, self.config.field_size);
            if legal {
                self.active[index].reshape(next);
                self.notifier.mark();
            }
            results.push(legal);
        }
        results
    }

    /// Sends each piece active at call time to the floor: one move by its
    /// full remaining drop distance, then one unit step, which takes the lock
    /// path. Returns whether the round accepted the command.
    pub fn drop_to_bottom(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        // Replacements spawned by the lock path are appended behind the
        // pieces already in play, so the front slot cycles through exactly
        // the pieces that were active when the call began.
        let pending = self.active.len();
        for _ in 0..pending {
            let Some(piece) = self.active.first() else {
                break;
            };
            let distance = self.distance_to_floor(piece);
            self.move_by(0, distance);
            self.move_by(0, 1);
        }
        true
    }

    /// Recolors every active piece. Returns whether the round accepted the
    /// command.
    pub fn change_color(&mut self, color: &str) -> bool {
        if !self.is_running() {
            return false;
        }
        for piece in &mut self.active {
            piece.recolor(color);
        }
        if !self.active.is_empty() {
            self.notifier.mark();
        }
        true
    }

    /// Locks a standalone cell into the field, subject to the wall and
    /// overlap constraints. Returns whether the cell was placed.
    pub fn place_cell(&mut self, position: Coord, color: &str) -> bool {
        let (width, height) = self.config.field_size;
        let (x, y) = position;
        if x < 0 || x > width - 1 || y > height - 1 {
            return false;
        }
        if self.all_coordinates().contains(&position) {
            return false;
        }
        self.locked.push(Cell {
            position,
            color: color.into(),
        });
        self.notifier.mark();
        true
    }

    // ---- pause / resume / restart --------------------------------------

    /// Suspends play: the gravity deadline is canceled so no late tick can
    /// fire, and every mutating command is rejected until [`Game::resume`].
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.phase = Phase::Paused;
        self.gravity.cancel();
        self.notifier.mark();
        true
    }

    /// Resumes a paused round and restarts the gravity cadence.
    pub fn resume(&mut self) -> bool {
        if !self.is_paused() {
            return false;
        }
        self.phase = Phase::Running;
        self.gravity.restart(self.clock, self.speed);
        self.notifier.mark();
        true
    }

    /// Begins a fresh round in place: field, score, speed, preview and the
    /// first active piece are re-initialized; all prior state and deadlines
    /// are discarded. Configuration and the registered change hook are kept.
    ///
    /// The new round's seed derives from the current generator, so a seeded
    /// game stays reproducible across restarts.
    pub fn restart(&mut self) {
        let seed: u64 = self.rng.random();
        self.seed = seed;
        self.rng = GameRng::seed_from_u64(seed);
        self.locked.clear();
        self.active.clear();
        self.score = 0;
        self.score_rate = 1;
        self.speed = self.config.initial_speed;
        self.phase = Phase::Running;
        self.clock = GameTime::ZERO;
        self.gravity = GravityTimer::idle();
        self.next_piece = Self::next_template(&self.catalog, &mut self.rng);
        self.spawn_active();
        if self.is_running() {
            self.gravity.restart(self.clock, self.speed);
        }
        self.notifier.mark();
    }

    // ---- gravity pump ---------------------------------------------------

    /// Advances the round's internal clock to `now`, firing one one-row
    /// downward move per elapsed gravity interval.
    ///
    /// In-game time is measured from the start of the current round and must
    /// never run backwards; after [`Game::restart`] the host restarts its
    /// epoch as well.
    ///
    /// # Errors
    ///
    /// [`UpdateError::TimeRewound`] if `now` lies before the current clock.
    pub fn update(&mut self, now: GameTime) -> Result<(), UpdateError> {
        if now < self.clock {
            return Err(UpdateError::TimeRewound);
        }
        while let Some(due) = self.gravity.next_due() {
            if due > now || !self.is_running() {
                break;
            }
            self.clock = due;
            // Anchor the cadence before the step; a speed change inside the
            // step replaces the deadline wholesale.
            self.gravity.advance();
            self.move_by(0, 1);
        }
        self.clock = now;
        Ok(())
    }

    // ---- spawning -------------------------------------------------------

    /// Draws a fresh preview template: random shape, random color, parked at
    /// the preview pivot.
    pub(crate) fn next_template(catalog: &ShapeCatalog, rng: &mut GameRng) -> Piece {
        let shape = catalog.random_shape(rng);
        let color = random_color(rng);
        Piece::new(PREVIEW_PIVOT, shape, color)
    }

    /// Takes the queued template onto the field and queues a fresh one.
    ///
    /// When no legal spawn placement exists the round ends with
    /// [`GameOver::SpawnBlocked`] and the piece comes to rest at an off-field
    /// sentinel pivot, where the phase guard keeps it inert.
    pub(crate) fn spawn_active(&mut self) {
        if !self.is_running() {
            return;
        }
        let shape = self.next_piece.shape();
        let color = self.next_piece.color().to_owned();
        let pivot = match self.spawn_pivot(&shape) {
            Some(pivot) => pivot,
            None => {
                self.end_round(GameOver::SpawnBlocked);
                BLOCKED_SPAWN_PIVOT
            }
        };
        self.active.push(Piece::new(pivot, shape, color));
        self.notifier.mark();
        self.next_piece = Self::next_template(&self.catalog, &mut self.rng);
    }

    /// Finds a spawn pivot for `shape`.
    ///
    /// Every column is a candidate at the entry row that keeps the shape's
    /// lowest cell just above the field. The search first demands that a
    /// column admit the piece's full height of virtual descent steps through
    /// the entry rows, then relaxes the required descent one row at a time;
    /// among the columns surviving at the first workable depth, one is drawn
    /// uniformly. `None` means no column works at any depth.
    fn spawn_pivot(&mut self, shape: &Shape) -> Option<Coord> {
        let (width, _) = self.config.field_size;
        let lowest = shape.iter().map(|&(_, dy)| dy).max().expect("shapes have four offsets");
        let highest = shape.iter().map(|&(_, dy)| dy).min().expect("shapes have four offsets");
        let entry_row = -1 - lowest;
        let height_in_rows = lowest - highest + 1;
        let obstacles = self.all_coordinates();
        for depth in (1..=height_in_rows).rev() {
            let candidates: Vec<Coord> = (0..width)
                .map(|x| (x, entry_row))
                .filter(|&(x, y)| {
                    (1..=depth).all(|step| {
                        self.rules
                            .admits((x, y + step), shape, &obstacles, self.config.field_size)
                    })
                })
                .collect();
            if !candidates.is_empty() {
                return Some(candidates[self.rng.random_range(0..candidates.len())]);
            }
        }
        None
    }

    // ---- locking and clearing -------------------------------------------

    /// How far `piece` could still fall before resting on a locked cell in
    /// one of its columns, or on the floor.
    fn distance_to_floor(&self, piece: &Piece) -> i32 {
        let (_, height) = self.config.field_size;
        piece
            .coordinates()
            .iter()
            .map(|&(x, y)| {
                let resting = self
                    .locked
                    .iter()
                    .filter(|cell| cell.position.0 == x && cell.position.1 > y)
                    .map(|cell| cell.position.1)
                    .min()
                    .unwrap_or(height);
                resting - y - 1
            })
            .min()
            .expect("pieces own four cells")
    }

    /// Locks every active piece that cannot fall any further: its cells join
    /// the field and a line-clear pass runs immediately. Returns how many
    /// pieces were locked.
    ///
    /// This check covers every active piece on every downward step, not only
    /// the piece that initiated the move.
    fn lock_landed(&mut self) -> usize {
        let mut locked = 0;
        let mut index = 0;
        while index < self.active.len() {
            if self.distance_to_floor(&self.active[index]) == 0 {
                let piece = self.active.remove(index);
                self.locked.extend(piece.into_cells());
                self.notifier.mark();
                self.clear_full_rows();
                locked += 1;
            } else {
                index += 1;
            }
        }
        locked
    }

    /// Clears every full row, recursing until none remain, then compacts the
    /// stack and checks for overflow.
    ///
    /// Score is credited once per cleared row at the current multiplier; the
    /// multiplier doubles after each row within the pass and resets to 1 once
    /// the cascade is done. The compaction step always runs: with no cleared
    /// rows its bound is the minimum row index and nothing moves.
    fn clear_full_rows(&mut self) {
        let (width, height) = self.config.field_size;
        let mut full_rows = Vec::new();
        for row in 0..height {
            let filled = self
                .locked
                .iter()
                .filter(|cell| cell.position.1 == row)
                .count();
            if filled == width as usize {
                full_rows.push(row);
            }
        }
        if !full_rows.is_empty() {
            for &row in &full_rows {
                self.locked.retain(|cell| cell.position.1 != row);
                let rate = self.score_rate;
                self.add_score(rate);
                self.score_rate *= 2;
            }
            self.notifier.mark();
            // Removal does not shift rows, so re-scan before compacting.
            self.clear_full_rows();
            self.score_rate = 1;
        }
        let boundary = full_rows.iter().copied().max().unwrap_or(i32::MIN);
        let layers = full_rows.len() as i32;
        let mut compacted = false;
        for cell in &mut self.locked {
            if cell.position.1 < boundary {
                cell.position.1 += layers;
                compacted = true;
            }
        }
        if compacted {
            self.notifier.mark();
        }
        if self.locked.iter().any(|cell| cell.position.1 < 0) {
            self.end_round(GameOver::Overflow);
        }
    }

    // ---- scoring and difficulty -----------------------------------------

    /// Credits `delta` points. Difficulty follows the score: speed grows by
    /// `delta / 500`, clamped to the playable range, and the gravity cadence
    /// restarts at the new interval.
    fn add_score(&mut self, delta: u32) {
        self.score += delta;
        self.set_speed(self.speed.get() + f64::from(delta) / 500.0);
        self.notifier.mark();
    }

    /// Clamps and applies a new fall speed; any speed write restarts gravity.
    fn set_speed(&mut self, value: f64) {
        self.speed = FallSpeed::new(value);
        if self.is_running() {
            self.gravity.restart(self.clock, self.speed);
        }
        self.notifier.mark();
    }

    fn end_round(&mut self, reason: GameOver) {
        self.phase = Phase::Over(reason);
        self.gravity.cancel();
        self.notifier.mark();
    }

    // ---- obstacle views --------------------------------------------------

    /// Coordinates of every cell on the field, locked and active alike.
    fn all_coordinates(&self) -> Vec<Coord> {
        let mut coordinates: Vec<Coord> = self.locked.iter().map(|cell| cell.position).collect();
        for piece in &self.active {
            coordinates.extend(piece.coordinates());
        }
        coordinates
    }

    /// Like [`Game::all_coordinates`], minus the cells of the active piece at
    /// `index`: the obstacle set that piece is validated against.
    fn obstacles_excluding(&self, index: usize) -> Vec<Coord> {
        let mut obstacles: Vec<Coord> = self.locked.iter().map(|cell| cell.position).collect();
        for (i, piece) in self.active.iter().enumerate() {
            if i != index {
                obstacles.extend(piece.coordinates());
            }
        }
        obstacles
    }
}

/// Draws an `rgba(..)` color string with channels in `[20, 256)` and alpha in
/// `[0.7, 1.0)`.
fn random_color(rng: &mut GameRng) -> String {
    let red = rng.random_range(20..256);
    let green = rng.random_range(20..256);
    let blue = rng.random_range(20..256);
    let alpha = rng.random::<f64>() * 0.3 + 0.7;
    format!("rgba({red}, {green}, {blue}, {alpha:.2})")
}
