//! End-to-end round behavior: gravity, descent and locking, line clears with
//! the cascading multiplier, score-coupled speed, the control states, and the
//! field invariants under sustained play.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use blockfall_engine::{
    Cell, Coord, FallSpeed, Game, GameOver, GameTime, ShapeCatalog, ShapeFamily,
};

const FLAT_I: ShapeFamily = [[(-1, 0), (0, 0), (1, 0), (2, 0)]; 4];
const REAL_I: ShapeFamily = [
    [(-1, 0), (0, 0), (1, 0), (2, 0)],
    [(0, -1), (0, 0), (0, 1), (0, 2)],
    [(1, 0), (0, 0), (-1, 0), (-2, 0)],
    [(0, 1), (0, 0), (0, -1), (0, -2)],
];
const SQUARE: ShapeFamily = [[(0, 0), (1, 0), (0, 1), (1, 1)]; 4];

/// Every draw is a horizontal I bar that never changes under rotation.
static FLAT_I_ONLY: [ShapeFamily; 7] = [FLAT_I; 7];
/// Every draw is an I piece with its real four rotation states.
static REAL_I_ONLY: [ShapeFamily; 7] = [REAL_I; 7];
/// Every draw is the square, which makes descent columns predictable.
static SQUARE_ONLY: [ShapeFamily; 7] = [SQUARE; 7];

fn square_game(seed: u64, starting_cells: Vec<Cell>) -> Game {
    Game::builder()
        .catalog(ShapeCatalog::from_families(&SQUARE_ONLY))
        .seed(seed)
        .starting_cells(starting_cells)
        .build()
}

fn cell(position: Coord) -> Cell {
    Cell {
        position,
        color: "rgba(128, 128, 128, 1.00)".to_owned(),
    }
}

/// A row filled at every column except the ones listed.
fn row_except(row: i32, open_columns: &[i32]) -> Vec<Cell> {
    (0..10)
        .filter(|x| !open_columns.contains(x))
        .map(|x| cell((x, row)))
        .collect()
}

/// Walks the single active piece sideways to the target pivot column.
fn steer_to(game: &mut Game, target_x: i32) {
    loop {
        let x = game.active_pieces()[0].pivot().0;
        if x == target_x {
            break;
        }
        let dx = if target_x > x { 1 } else { -1 };
        assert!(game.move_by(dx, 0), "steering must stay within the walls");
    }
}

fn occupied(game: &Game) -> Vec<Coord> {
    game.cells().iter().map(|cell| cell.position).collect()
}

fn assert_no_overlap(game: &Game) {
    let mut coordinates = occupied(game);
    let before = coordinates.len();
    coordinates.sort_unstable();
    coordinates.dedup();
    assert_eq!(before, coordinates.len(), "two cells share a coordinate");
}

fn sorted_locked(game: &Game) -> Vec<Coord> {
    let mut coordinates: Vec<Coord> = game
        .locked_cells()
        .iter()
        .map(|cell| cell.position)
        .collect();
    coordinates.sort_unstable();
    coordinates
}

#[test]
fn gravity_drops_one_row_per_interval() {
    let mut game = Game::builder().seed(7).build();
    let start_y = game.active_pieces()[0].pivot().1;
    // Default speed is one tick per second; deadlines at 1s, 2s, 3s.
    game.update(GameTime::from_millis(3500)).unwrap();
    assert_eq!(game.active_pieces()[0].pivot().1, start_y + 3);
    assert_eq!(game.next_gravity_at(), Some(GameTime::from_secs(4)));
}

#[test]
fn update_rejects_a_rewound_clock() {
    let mut game = Game::builder().seed(7).build();
    game.update(GameTime::from_secs(2)).unwrap();
    assert!(game.update(GameTime::from_secs(1)).is_err());
    // The clock itself is fine to revisit.
    game.update(GameTime::from_secs(2)).unwrap();
}

#[test]
fn horizontal_bar_descends_the_full_field_height_before_locking() {
    let mut game = Game::builder()
        .catalog(ShapeCatalog::from_families(&FLAT_I_ONLY))
        .seed(3)
        .build();
    assert_eq!(game.active_pieces()[0].pivot().1, -1);

    for step in 1..=20 {
        assert!(game.move_by(0, 1), "descent step {step} must succeed");
        assert_eq!(game.active_pieces()[0].pivot().1, -1 + step);
        assert!(game.locked_cells().is_empty());
    }
    // The bar now rests on the floor; the next downward step locks it and
    // spawns the replacement.
    assert!(game.move_by(0, 1));
    assert_eq!(game.locked_cells().len(), 4);
    assert!(game
        .locked_cells()
        .iter()
        .all(|cell| cell.position.1 == 19));
    assert_eq!(game.active_pieces().len(), 1);
    assert_eq!(game.active_pieces()[0].pivot().1, -1);
}

#[test]
fn completing_a_row_clears_scores_and_compacts() {
    let mut starting = row_except(19, &[0, 1]);
    starting.push(cell((5, 18)));
    let mut game = square_game(21, starting);

    steer_to(&mut game, 0);
    assert!(game.drop_to_bottom());

    assert_eq!(game.score(), 1);
    assert_eq!(game.speed().get(), 1.0 + 1.0 / 500.0);
    // The square's upper half and the marker cell moved down one row.
    assert_eq!(sorted_locked(&game), vec![(0, 19), (1, 19), (5, 19)]);
    assert_eq!(game.active_pieces().len(), 1);
    assert_no_overlap(&game);
}

#[test]
fn simultaneous_rows_double_the_multiplier_then_reset_it() {
    let mut starting = row_except(18, &[0, 1]);
    starting.extend(row_except(19, &[0, 1]));
    let mut game = square_game(22, starting);

    steer_to(&mut game, 0);
    assert!(game.drop_to_bottom());

    // Two rows in one pass: 1 for the first, doubled to 2 for the second.
    assert_eq!(game.score(), 3);
    let mut expected_speed = 1.0 + 1.0 / 500.0;
    expected_speed += 2.0 / 500.0;
    assert_eq!(game.speed().get(), expected_speed);
    assert!(game.locked_cells().is_empty());

    // The multiplier is back at 1 for the next clear.
    for column in 2..10 {
        assert!(game.place_cell((column, 19), "rgba(90, 90, 90, 1.00)"));
    }
    steer_to(&mut game, 0);
    assert!(game.drop_to_bottom());
    assert_eq!(game.score(), 4);
    assert_eq!(sorted_locked(&game), vec![(0, 19), (1, 19)]);
}

#[test]
fn a_cell_stuck_above_the_field_ends_the_round() {
    let mut game = square_game(8, vec![cell((0, -1))]);
    assert!(game.is_running());

    // The next lock triggers a clear pass, which finds the overhead cell.
    assert!(game.drop_to_bottom());
    assert_eq!(game.game_over_reason(), Some(GameOver::Overflow));
    assert!(game.active_pieces().is_empty());
    assert_eq!(game.next_gravity_at(), None);

    // Terminal: every command is a rejected no-op.
    assert!(!game.move_by(0, 1));
    assert!(game.rotate().is_empty());
    assert!(!game.drop_to_bottom());
    assert!(!game.change_color("rgba(0, 0, 0, 1.00)"));
    assert!(!game.pause());
    assert!(!game.resume());
    let before = occupied(&game);
    game.update(GameTime::from_secs(30)).unwrap();
    assert_eq!(occupied(&game), before);
}

#[test]
fn a_full_top_row_blocks_the_first_spawn() {
    let game = square_game(4, row_except(0, &[]));
    assert_eq!(game.game_over_reason(), Some(GameOver::SpawnBlocked));
    // The piece that found no entry rests at the off-field sentinel.
    assert_eq!(game.active_pieces()[0].pivot(), (-5, -5));
    assert_eq!(game.next_gravity_at(), None);
}

#[test]
fn four_rotations_cycle_an_unobstructed_piece() {
    let mut game = Game::builder().seed(11).build();
    for _ in 0..3 {
        assert!(game.move_by(0, 1));
    }
    steer_to(&mut game, 4);
    let pivot = game.active_pieces()[0].pivot();
    let starting_shape = game.active_pieces()[0].shape();
    for turn in 1..=4 {
        assert_eq!(game.rotate(), vec![true], "turn {turn}");
        assert_no_overlap(&game);
    }
    assert_eq!(game.active_pieces()[0].shape(), starting_shape);
    assert_eq!(game.active_pieces()[0].pivot(), pivot);
}

#[test]
fn a_blocked_rotation_leaves_the_piece_unchanged() {
    let mut game = Game::builder()
        .catalog(ShapeCatalog::from_families(&REAL_I_ONLY))
        .seed(9)
        .build();
    steer_to(&mut game, 4);
    // Normalize to a horizontal state; mid-air this always succeeds.
    if game.active_pieces()[0]
        .shape()
        .iter()
        .any(|&(_, dy)| dy != 0)
    {
        assert_eq!(game.rotate(), vec![true]);
    }
    // Walk the bar down to the floor without triggering the lock path.
    while game.active_pieces()[0].pivot().1 < 19 {
        assert!(game.move_by(0, 1));
    }
    let before = game.active_pieces()[0].clone();
    // Turning upright would reach below the floor.
    assert_eq!(game.rotate(), vec![false]);
    assert_eq!(game.active_pieces()[0], before);
}

#[test]
fn pausing_suspends_gravity_and_commands() {
    let mut game = Game::builder().seed(13).build();
    assert!(game.pause());
    assert!(!game.pause());
    assert!(game.is_paused());
    assert_eq!(game.next_gravity_at(), None);

    let pivot = game.active_pieces()[0].pivot();
    assert!(!game.move_by(0, 1));
    assert!(game.rotate().is_empty());
    assert!(!game.drop_to_bottom());
    assert!(!game.change_color("rgba(9, 9, 9, 1.00)"));
    game.update(GameTime::from_secs(10)).unwrap();
    assert_eq!(game.active_pieces()[0].pivot(), pivot);

    assert!(game.resume());
    assert!(!game.resume());
    // The cadence restarts relative to the resumed clock.
    assert_eq!(game.next_gravity_at(), Some(GameTime::from_secs(11)));
    game.update(GameTime::from_secs(11)).unwrap();
    assert_eq!(game.active_pieces()[0].pivot(), (pivot.0, pivot.1 + 1));
}

#[test]
fn restart_begins_a_fresh_round() {
    let mut game = square_game(17, vec![cell((7, 19))]);
    assert!(game.move_by(0, 1));
    let revision_before = game.revision();

    game.restart();
    assert!(game.is_running());
    assert_eq!(game.score(), 0);
    assert_eq!(game.speed(), FallSpeed::default());
    assert!(game.locked_cells().is_empty());
    assert_eq!(game.active_pieces().len(), 1);
    assert!(game.revision() > revision_before);
    // The round's epoch restarted with it.
    game.update(GameTime::from_secs(1)).unwrap();
}

#[test]
fn change_color_recolors_active_pieces_only() {
    let mut game = Game::builder().seed(19).build();
    assert_eq!(game.preview().pivot(), (2, 2));
    let preview_color = game.preview().color().to_owned();

    assert!(game.change_color("rgba(1, 2, 3, 1.00)"));
    assert!(game.active_pieces()[0]
        .cells()
        .iter()
        .all(|cell| cell.color == "rgba(1, 2, 3, 1.00)"));
    assert_eq!(game.preview().color(), preview_color);
}

#[test]
fn place_cell_validates_bounds_and_overlap() {
    let mut game = square_game(23, Vec::new());
    assert!(game.place_cell((0, 19), "rgba(50, 50, 50, 1.00)"));
    assert!(!game.place_cell((0, 19), "rgba(50, 50, 50, 1.00)"));
    assert!(!game.place_cell((-1, 5), "rgba(50, 50, 50, 1.00)"));
    assert!(!game.place_cell((10, 5), "rgba(50, 50, 50, 1.00)"));
    assert!(!game.place_cell((0, 20), "rgba(50, 50, 50, 1.00)"));
    // Above the visible field is inside the walls.
    assert!(game.place_cell((0, -3), "rgba(50, 50, 50, 1.00)"));
}

#[test]
fn change_hook_fires_and_revision_advances() {
    let mut game = Game::builder().seed(29).build();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    game.set_change_hook(Box::new(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    }));

    let revision_before = game.revision();
    assert!(game.move_by(0, 1));
    assert!(fired.load(Ordering::Relaxed) > 0);
    assert!(game.revision() > revision_before);
}

#[test]
fn sustained_play_preserves_the_field_invariants() {
    let (width, height) = (10, 20);
    let mut game = Game::builder().seed(0xF0CACC1A).build();
    let mut now = GameTime::ZERO;
    for step in 0u32..400 {
        match step % 5 {
            0 => {
                let _ = game.move_by(-1, 0);
            }
            1 => {
                let _ = game.rotate();
            }
            2 => {
                let _ = game.move_by(1, 0);
            }
            3 => {
                let _ = game.move_by(0, 1);
            }
            _ => {
                now += GameTime::from_millis(700);
                game.update(now).unwrap();
            }
        }
        if game.is_over() {
            break;
        }
        assert_no_overlap(&game);
        for piece in game.active_pieces() {
            for &(x, y) in &piece.coordinates() {
                assert!(0 <= x && x < width, "active cell left the walls");
                assert!(y < height, "active cell sank below the floor");
            }
        }
    }
}
