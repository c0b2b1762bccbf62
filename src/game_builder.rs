/*!
This module handles creation / initialization of [`Game`]s.
*/

use rand_chacha::rand_core::SeedableRng;

use super::*;

/// This builder exposes the ability to configure a new [`Game`] to varying
/// degrees.
///
/// Call [`GameBuilder::new`] or [`Game::builder`], chain calls to setters,
/// then call [`GameBuilder::build`] or [`GameBuilder::build_ruled`]. The
/// builder is not used up and its configuration can be re-used to initialize
/// more games.
#[derive(Clone, Default, Debug)]
pub struct GameBuilder {
    /// The configuration options that will be set for the game.
    pub config: Configuration,
    /// The value to seed the game's PRNG with; a fresh random seed if `None`.
    pub seed: Option<u64>,
    /// The rotation-state tables the game will draw its pieces from.
    pub catalog: ShapeCatalog,
    /// Cells locked into the field before the first piece spawns.
    pub starting_cells: Vec<Cell>,
}

impl GameBuilder {
    /// Creates a blank new template representing a yet-to-be-started [`Game`]
    /// ready for configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Game`] with the information specified by `self`.
    pub fn build(&self) -> Game {
        self.build_ruled([])
    }

    /// Creates a [`Game`] with the information specified by `self` and some
    /// one-time extra placement rules, registered behind the standard
    /// boundary and overlap rules.
    pub fn build_ruled(&self, extra_rules: impl IntoIterator<Item = PlacementRule>) -> Game {
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut rules = RuleSet::standard();
        for rule in extra_rules {
            rules.register(rule);
        }
        let mut rng = GameRng::seed_from_u64(seed);
        let next_piece = Game::next_template(&self.catalog, &mut rng);

        let mut game = Game {
            config: self.config,
            catalog: self.catalog,
            rules,
            rng,
            seed,
            locked: self.starting_cells.clone(),
            active: Vec::new(),
            next_piece,
            score: 0,
            score_rate: 1,
            speed: self.config.initial_speed,
            phase: Phase::Running,
            clock: GameTime::ZERO,
            gravity: GravityTimer::idle(),
            notifier: ChangeNotifier::default(),
        };
        game.spawn_active();
        // A blocked first spawn ends the round during `spawn_active`; only a
        // live round gets a gravity cadence.
        if game.is_running() {
            game.gravity.restart(game.clock, game.speed);
        }
        game
    }

    /// Sets the field size as `(width, height)` in cells.
    pub fn field_size(&mut self, x: Coord) -> &mut Self {
        self.config.field_size = x;
        self
    }

    /// Sets the fall speed at the start of the round.
    pub fn initial_speed(&mut self, x: FallSpeed) -> &mut Self {
        self.config.initial_speed = x;
        self
    }

    /// The value to seed the game's PRNG with.
    pub fn seed(&mut self, x: u64) -> &mut Self {
        self.seed = Some(x);
        self
    }

    /// The rotation-state tables the game will draw its pieces from.
    pub fn catalog(&mut self, x: ShapeCatalog) -> &mut Self {
        self.catalog = x;
        self
    }

    /// Cells locked into the field before the first piece spawns.
    pub fn starting_cells(&mut self, x: impl IntoIterator<Item = Cell>) -> &mut Self {
        self.starting_cells = x.into_iter().collect();
        self
    }
}
