/*!
# Blockfall Engine

`blockfall_engine` is an observable falling-block puzzle engine: the field
model, the seven tetromino families with their precomputed rotation states,
an extensible placement-rule check, gravity-driven descent, cascading line
clears and score-coupled difficulty. Rendering and input wiring are left to a
host; the engine emits a no-payload change signal after every committed
mutation and exposes read accessors for the host to redraw from.

# Examples

```
use blockfall_engine::{Game, GameTime};

// Starting up a round - in-game time starts at 0s and is supplied by the host.
let mut game = Game::builder().seed(42).build();

// Steer the falling piece; commands report whether they were accepted.
let _ = game.move_by(1, 0);

// Pump in-game time; every elapsed gravity interval drops the piece one row.
game.update(GameTime::from_millis(2500)).unwrap();

// Read most recent state; this is how a UI knows what to draw.
assert!(!game.cells().is_empty());
```
*/

#![warn(missing_docs)]

mod fall_speed;
mod game_builder;
mod game_update;
mod gravity;
mod piece;
mod placement_rules;
mod shape_catalog;

use std::{fmt, time::Duration};

use rand_chacha::ChaCha12Rng;

pub use fall_speed::FallSpeed;
pub use game_builder::GameBuilder;
pub use gravity::GravityTimer;
pub use piece::{Cell, Piece};
pub use placement_rules::{boundary_rule, overlap_rule, PlacementRule, RuleFn, RuleSet};
pub use shape_catalog::{
    rotated_clockwise, rotated_counterclockwise, ShapeCatalog, ShapeFamily,
};

/// Coordinates on the playing grid: `(x, y)` with `x` the column and `y` the
/// row, rows growing downward. Rows above the visible field are negative.
pub type Coord = (i32, i32);
/// Coordinate offsets that can be added to [`Coord`]inates.
pub type Offset = (i32, i32);
/// An ordered set of four offsets relative to an implicit pivot at `(0, 0)`:
/// one rotation state of a tetromino. Immutable once constructed; the order
/// is stable but carries no meaning beyond indexing.
pub type Shape = [Offset; 4];
/// The type used to identify points in time on a round's internal timeline.
pub type GameTime = Duration;
/// The internal RNG used by a game.
pub type GameRng = ChaCha12Rng;
/// Type of the no-payload callback invoked after every committed mutation.
pub type ChangeHook = dyn FnMut() + Send;

/// Represents one of the seven "Tetrominos";
///
/// A *tetromino* is a two-dimensional, geometric shape made by connecting
/// four squares along their edges.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tetromino {
    /// 'I'-Tetromino; four squares in a straight line.
    I = 0,
    /// 'J'-Tetromino.
    J,
    /// 'L'-Tetromino.
    L,
    /// 'O'-Tetromino; one big square, no visual rotation.
    O,
    /// 'S'-Tetromino.
    S,
    /// 'T'-Tetromino.
    T,
    /// 'Z'-Tetromino.
    Z,
}

impl Tetromino {
    /// All `Tetromino` enum variants in order.
    ///
    /// Note that `Tetromino::VARIANTS[t as usize] == t` always holds.
    pub const VARIANTS: [Self; 7] = {
        use Tetromino::*;
        [I, J, L, O, S, T, Z]
    };
}

/// Represents how a round can end.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameOver {
    /// No column admitted a spawn placement at any entry depth: the stack has
    /// grown into the entry rows.
    SpawnBlocked,
    /// A locked cell sits above the visible field after a line-clear pass.
    Overflow,
}

/// The control state a round is in.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Commands and gravity apply.
    Running,
    /// Gravity is canceled and every mutating command is a rejected no-op
    /// until [`Game::resume`].
    Paused,
    /// Terminal, except for [`Game::restart`].
    Over(GameOver),
}

/// Configuration options of the game, consumed at construction.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    /// Field size as `(width, height)` in cells.
    pub field_size: Coord,
    /// Fall speed at the start of a round.
    pub initial_speed: FallSpeed,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            field_size: (10, 20),
            initial_speed: FallSpeed::default(),
        }
    }
}

/// Emits the engine's no-payload "state changed" signal.
///
/// Every committed mutation bumps [`revision`](Self::revision) and invokes
/// the registered hook, if any. Consumers re-read current state; no diff is
/// carried.
#[derive(Default)]
pub struct ChangeNotifier {
    revision: u64,
    hook: Option<Box<ChangeHook>>,
}

impl ChangeNotifier {
    /// Count of committed mutations so far; hosts may poll this instead of
    /// registering a hook.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Registers the callback fired after every committed mutation, replacing
    /// any previous one.
    pub fn set_hook(&mut self, hook: Box<ChangeHook>) {
        self.hook = Some(hook);
    }

    pub(crate) fn mark(&mut self) {
        self.revision += 1;
        if let Some(hook) = &mut self.hook {
            hook();
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("ChangeNotifier")
            .field("revision", &self.revision)
            .field("hook", &self.hook.as_ref().map(std::any::type_name_of_val))
            .finish()
    }
}

/// An error that can be thrown by [`Game::update`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum UpdateError {
    /// The requested update time lies in the round's past (`<` the clock).
    TimeRewound,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateError::TimeRewound => "attempt to update game to a timestamp it already passed",
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for UpdateError {}

/// Main game struct representing a round of play.
///
/// All state mutation happens through the command methods on one logical
/// thread; hosts driving the game from several OS threads must serialize the
/// calls behind one exclusive section.
#[derive(Debug)]
pub struct Game {
    /// Field size and initial speed, as configured at construction.
    pub config: Configuration,
    catalog: ShapeCatalog,
    rules: RuleSet,
    rng: GameRng,
    seed: u64,
    locked: Vec<Cell>,
    active: Vec<Piece>,
    next_piece: Piece,
    score: u32,
    score_rate: u32,
    speed: FallSpeed,
    phase: Phase,
    clock: GameTime,
    gravity: GravityTimer,
    notifier: ChangeNotifier,
}

impl Game {
    /// Creates a blank new template representing a yet-to-be-started [`Game`]
    /// ready for configuration.
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    /// Snapshot of every cell on the field, locked and active alike.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = self.locked.clone();
        for piece in &self.active {
            cells.extend_from_slice(piece.cells());
        }
        cells
    }

    /// Read accessor for the cells locked into the field.
    pub fn locked_cells(&self) -> &[Cell] {
        &self.locked
    }

    /// Read accessor for the pieces currently falling.
    ///
    /// Normally exactly one, though the model supports more.
    pub fn active_pieces(&self) -> &[Piece] {
        &self.active
    }

    /// The queued piece template shown as a preview; it is parked off-field
    /// and not part of [`Game::cells`].
    pub const fn preview(&self) -> &Piece {
        &self.next_piece
    }

    /// Current score. Monotonic while a round is played.
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Current fall speed.
    pub const fn speed(&self) -> FallSpeed {
        self.speed
    }

    /// Read accessor for the control state.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether commands and gravity currently apply.
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running)
    }

    /// Whether the round is paused.
    pub const fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused)
    }

    /// Whether the round has ended.
    pub const fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Over(_))
    }

    /// Why the round ended, if it has.
    pub const fn game_over_reason(&self) -> Option<GameOver> {
        match self.phase {
            Phase::Over(reason) => Some(reason),
            _ => None,
        }
    }

    /// The seed this round's piece sequence and colors derive from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Count of committed mutations; see [`ChangeNotifier::revision`].
    pub const fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    /// Registers the change callback fired after every committed mutation.
    pub fn set_change_hook(&mut self, hook: Box<ChangeHook>) {
        self.notifier.set_hook(hook);
    }

    /// Retrieve when the next gravity tick is scheduled, if any.
    ///
    /// Lets a host sleep until the next autonomous state change instead of
    /// polling [`Game::update`].
    pub const fn next_gravity_at(&self) -> Option<GameTime> {
        self.gravity.next_due()
    }

    /// Appends a placement rule behind the standard ones; it applies to every
    /// subsequent placement check.
    pub fn register_rule(&mut self, rule: PlacementRule) {
        self.rules.register(rule);
    }
}
