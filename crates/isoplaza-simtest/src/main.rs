//! IsoPlaza Headless Room Harness
//!
//! Drives the room engine through scripted sessions and a seeded
//! random-click fuzz. Runs entirely in-process, no window and no network.
//!
//! Usage:
//!   cargo run -p isoplaza-simtest
//!   cargo run -p isoplaza-simtest -- --verbose

use isoplaza_logic::chat::{ChatCommand, ChatMessage};
use isoplaza_logic::config::{validate_config, EngineConfig};
use isoplaza_logic::facing::Facing;
use isoplaza_logic::grid::{Cell, Grid};
use isoplaza_logic::input::{InputEvent, MoveKey};
use isoplaza_logic::interaction::{approach_cell, ClickOutcome};
use isoplaza_logic::iso::{IsoProjector, Viewport};
use isoplaza_logic::layout::{validate_layout, RoomId, RoomLayout};
use isoplaza_logic::motion::{MotionState, NavOutcome, SitOutcome};
use isoplaza_logic::peers::Peer;
use isoplaza_logic::sim::{FrameInput, OutboundEvent, RoomSimulation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

const DT: f32 = 1.0 / 60.0;
const FRAME_MS: u64 = 16;
const VIEW_W: f32 = 1280.0;
const VIEW_H: f32 = 720.0;

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== IsoPlaza Room Harness ===\n");

    let mut results = Vec::new();

    // 1. Engine configuration
    results.extend(validate_configuration(verbose));

    // 2. Room catalogue
    results.extend(validate_room_catalogue(verbose));

    // 3. Projection round trips
    results.extend(validate_projection(verbose));

    // 4. Pathfinding on preset grids
    results.extend(validate_pathfinding(verbose));

    // 5. Click navigation and stall visits
    results.extend(validate_navigation(verbose));

    // 6. Seats
    results.extend(validate_seating(verbose));

    // 7. Peers and chat
    results.extend(validate_social(verbose));

    // 8. Random-click fuzz
    results.extend(fuzz_random_clicks(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn session(room: RoomId) -> RoomSimulation {
    let mut sim = RoomSimulation::new(EngineConfig::default(), room, "harness");
    sim.set_viewport(VIEW_W, VIEW_H);
    sim
}

fn cell_centre(sim: &RoomSimulation, cell: Cell) -> (f32, f32) {
    sim.projector()
        .project(cell.x as f32 + 0.5, cell.y as f32 + 0.5)
}

/// Tick `frames` frames after `now`; returns the new wall clock.
fn run_frames(sim: &mut RoomSimulation, mut now: u64, frames: u32) -> u64 {
    for _ in 0..frames {
        now += FRAME_MS;
        sim.tick(FrameInput::new(DT, now));
    }
    now
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_configuration(verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let defaults = EngineConfig::default();
    let errors = validate_config(&defaults);
    results.push(TestResult {
        name: "config_defaults_valid".into(),
        passed: errors.is_empty(),
        detail: format!("{} error(s) in defaults", errors.len()),
    });

    let round_trip = serde_json::to_string(&defaults)
        .map_err(|e| e.to_string())
        .and_then(|json| EngineConfig::from_json(&json).map_err(|e| e.to_string()));
    results.push(TestResult {
        name: "config_json_round_trip".into(),
        passed: round_trip.as_ref() == Ok(&defaults),
        detail: match &round_trip {
            Ok(_) => "defaults survive serialization".into(),
            Err(e) => e.clone(),
        },
    });

    match EngineConfig::from_json(r#"{ "travel_speed": 4.0, "report_interval_ms": 250 }"#) {
        Ok(c) => results.push(TestResult {
            name: "config_json_overrides".into(),
            passed: c.travel_speed == 4.0 && c.report_interval_ms == 250 && c.tile_width == 54.0,
            detail: format!("speed={} interval={}ms", c.travel_speed, c.report_interval_ms),
        }),
        Err(e) => results.push(TestResult {
            name: "config_json_overrides".into(),
            passed: false,
            detail: format!("JSON parse error: {}", e),
        }),
    }

    let broken = EngineConfig {
        tile_width: 0.0,
        travel_speed: -1.0,
        hover_radius: 0.0,
        ..EngineConfig::default()
    };
    let errors = validate_config(&broken);
    if verbose {
        for e in &errors {
            println!("    rejected: {}", e);
        }
    }
    results.push(TestResult {
        name: "config_reports_every_error".into(),
        passed: errors.len() == 3,
        detail: format!("{} errors for 3 bad fields", errors.len()),
    });

    results
}

// ── 2. Room Catalogue ───────────────────────────────────────────────────

fn validate_room_catalogue(verbose: bool) -> Vec<TestResult> {
    println!("--- Room Catalogue ---");
    let mut results = Vec::new();

    for id in RoomId::ALL {
        let layout = RoomLayout::preset(id);
        let grid = Grid::from_layout(&layout);
        let tag = id.name();

        let issues = validate_layout(&layout);
        results.push(TestResult {
            name: format!("{}_layout_valid", tag),
            passed: issues.is_empty(),
            detail: if issues.is_empty() {
                format!(
                    "{} walkable of {} cells, {} seats, {} stalls",
                    grid.walkable_count(),
                    grid.len(),
                    layout.seats.len(),
                    layout.stalls.len()
                )
            } else {
                format!("{} issue(s), first: {}", issues.len(), issues[0])
            },
        });

        let round_trip = layout
            .to_json()
            .and_then(|json| RoomLayout::from_json(&json));
        results.push(TestResult {
            name: format!("{}_json_round_trip", tag),
            passed: round_trip.as_ref().is_ok_and(|l| *l == layout),
            detail: match &round_trip {
                Ok(_) => "layout survives JSON".into(),
                Err(e) => format!("{}", e),
            },
        });

        let ring_ok = grid.cells().all(|c| {
            let on_ring = c.x == 0 || c.y == 0 || c.x == grid.cols() - 1 || c.y == grid.rows() - 1;
            !on_ring || !grid.is_walkable_cell(c)
        });
        results.push(TestResult {
            name: format!("{}_border_ring", tag),
            passed: ring_ok,
            detail: "outer ring is never walkable".into(),
        });

        let unreachable_seats: Vec<Cell> = layout
            .seats
            .iter()
            .map(|s| s.cell())
            .filter(|&c| c != layout.spawn && grid.find_path(layout.spawn, c).len() < 2)
            .collect();
        results.push(TestResult {
            name: format!("{}_seats_reachable", tag),
            passed: unreachable_seats.is_empty(),
            detail: format!("{} unreachable seat(s)", unreachable_seats.len()),
        });

        let enclosed: Vec<&str> = layout
            .stalls
            .iter()
            .filter(|s| approach_cell(&grid, s.cell()).is_none())
            .map(|s| s.id.as_str())
            .collect();
        if verbose && !enclosed.is_empty() {
            println!("    {} stalls with no approach: {:?}", tag, enclosed);
        }
        results.push(TestResult {
            name: format!("{}_stalls_approachable", tag),
            passed: enclosed.len() < layout.stalls.len(),
            detail: format!(
                "{}/{} stalls have an approach cell",
                layout.stalls.len() - enclosed.len(),
                layout.stalls.len()
            ),
        });
    }

    results.push(TestResult {
        name: "room_id_parse".into(),
        passed: RoomId::parse("Café") == RoomId::Cafe
            && RoomId::parse("ROOFTOP") == RoomId::Rooftop
            && RoomId::parse("basement") == RoomId::Lobby,
        detail: "case-insensitive, unknown → lobby".into(),
    });

    results
}

// ── 3. Projection ───────────────────────────────────────────────────────

fn validate_projection(_verbose: bool) -> Vec<TestResult> {
    println!("--- Projection ---");
    let mut results = Vec::new();

    let mut worst = 0.0f32;
    for (w, h) in [(1.0, 1.0), (640.0, 480.0), (1280.0, 720.0), (2560.0, 1440.0)] {
        let p = IsoProjector::centered(Viewport::new(w, h), 20, 16, 54.0, 27.0, 6.0);
        for y in 0..16 {
            for x in 0..20 {
                let (px, py) = p.project(x as f32, y as f32);
                let (gx, gy) = p.unproject(px, py);
                worst = worst.max((gx - x as f32).abs()).max((gy - y as f32).abs());
            }
        }
    }
    results.push(TestResult {
        name: "projection_round_trip".into(),
        passed: worst < 1e-3,
        detail: format!("max error {:.2e} tiles", worst),
    });

    let p = IsoProjector::centered(Viewport::new(VIEW_W, VIEW_H), 20, 16, 54.0, 27.0, 6.0);
    let mut picked_ok = true;
    for y in 0..16 {
        for x in 0..20 {
            let (px, py) = p.project(x as f32 + 0.5, y as f32 + 0.5);
            picked_ok &= p.pick_cell(px, py) == Cell::new(x, y);
        }
    }
    results.push(TestResult {
        name: "projection_pick_centre".into(),
        passed: picked_ok,
        detail: "diamond centres pick their own cell".into(),
    });

    let (cx, _) = p.project(0.0, 0.0);
    results.push(TestResult {
        name: "projection_floor_inside_view".into(),
        passed: cx > 0.0 && cx < VIEW_W,
        detail: format!("top corner at x={}", cx),
    });

    results
}

// ── 4. Pathfinding ──────────────────────────────────────────────────────

fn validate_pathfinding(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pathfinding ---");
    let mut results = Vec::new();

    let open = Grid::open(20, 16);
    let straight = open.find_path(Cell::new(6, 6), Cell::new(10, 6));
    let expected: Vec<Cell> = (6..=10).map(|x| Cell::new(x, 6)).collect();
    results.push(TestResult {
        name: "pathfind_straight".into(),
        passed: straight == expected,
        detail: format!("(6,6)→(10,6) = {} nodes", straight.len()),
    });

    let lobby = Grid::from_layout(&RoomLayout::preset(RoomId::Lobby));
    let detour = lobby.find_path(Cell::new(6, 7), Cell::new(13, 7));
    let adjacent = detour.windows(2).all(|w| w[0].is_adjacent(w[1]));
    let walkable = detour.iter().all(|&c| lobby.is_walkable_cell(c));
    results.push(TestResult {
        name: "pathfind_detour".into(),
        passed: detour.len() > 8 && adjacent && walkable,
        detail: format!("around the central block in {} nodes", detour.len()),
    });

    let blocked = lobby.find_path(Cell::new(6, 6), Cell::new(9, 7));
    results.push(TestResult {
        name: "pathfind_blocked_goal".into(),
        passed: blocked == vec![Cell::new(6, 6)],
        detail: "blocked goal → [start]".into(),
    });

    let mut walled = Grid::open(20, 16);
    for y in 0..16 {
        walled.block(10, y);
    }
    let cut = walled.find_path(Cell::new(3, 3), Cell::new(15, 3));
    results.push(TestResult {
        name: "pathfind_unreachable".into(),
        passed: cut == vec![Cell::new(3, 3)],
        detail: "split room → [start]".into(),
    });

    results
}

// ── 5. Navigation ───────────────────────────────────────────────────────

fn validate_navigation(verbose: bool) -> Vec<TestResult> {
    println!("--- Navigation ---");
    let mut results = Vec::new();

    // Floor click
    let mut sim = session(RoomId::Lobby);
    let (px, py) = cell_centre(&sim, Cell::new(4, 7));
    let outcome = sim.click(px, py);
    run_frames(&mut sim, 0, 120);
    results.push(TestResult {
        name: "nav_floor_click".into(),
        passed: matches!(
            outcome,
            ClickOutcome::Floor {
                outcome: NavOutcome::Started { .. },
                ..
            }
        ) && sim.avatar().cell() == Cell::new(4, 7)
            && sim.state() == MotionState::Idle,
        detail: format!("ended at {:?} facing {}", sim.avatar().cell(), sim.avatar().facing.letter()),
    });

    // Blocked click
    let mut sim = session(RoomId::Lobby);
    let (px, py) = cell_centre(&sim, Cell::new(10, 7));
    let outcome = sim.click(px, py);
    run_frames(&mut sim, 0, 60);
    results.push(TestResult {
        name: "nav_blocked_click".into(),
        passed: matches!(
            outcome,
            ClickOutcome::Floor {
                outcome: NavOutcome::Rejected,
                ..
            }
        ) && sim.avatar().cell() == Cell::new(6, 6),
        detail: "avatar stays on spawn".into(),
    });

    // Held key steps
    let mut sim = session(RoomId::Lobby);
    sim.handle_input(&InputEvent::KeyDown(MoveKey::Left));
    let now = run_frames(&mut sim, 0, 40);
    sim.handle_input(&InputEvent::KeyUp(MoveKey::Left));
    run_frames(&mut sim, now, 30);
    results.push(TestResult {
        name: "nav_held_keys".into(),
        passed: sim.avatar().cell().x < 6 && sim.avatar().facing == Facing::West,
        detail: format!("walked to {:?}", sim.avatar().cell()),
    });

    // Stall visit: prompt once, on arrival
    let mut sim = session(RoomId::Lobby);
    let stall_cell = sim
        .layout()
        .stall("prediction-stall")
        .map(|s| s.cell())
        .unwrap_or(Cell::new(3, 4));
    let (sx, sy) = sim.projector().project_cell(stall_cell);
    let outcome = sim.click(sx, sy - 10.0);
    let due = match outcome {
        ClickOutcome::StallApproach { due_at_ms, .. } => Some(due_at_ms),
        _ => None,
    };
    let mut raised = 0;
    let mut early = false;
    let mut had = false;
    let mut now = 0;
    for _ in 0..240 {
        now += FRAME_MS;
        sim.tick(FrameInput::new(DT, now));
        let has = sim.prompt().is_some();
        if has && !had {
            raised += 1;
            early |= due.is_some_and(|d| now < d);
        }
        had = has;
    }
    if verbose {
        if let Some(p) = sim.prompt() {
            println!("    prompt: {} / {}", p.heading(), p.description());
        }
    }
    sim.handle_input(&InputEvent::ConfirmVisit);
    let visits = sim
        .drain_events()
        .iter()
        .filter(|e| matches!(e, OutboundEvent::StallVisit { .. }))
        .count();
    results.push(TestResult {
        name: "nav_stall_visit".into(),
        passed: due.is_some() && raised == 1 && !early && visits == 1,
        detail: format!("due={:?}ms raised={} visits={}", due, raised, visits),
    });

    // Preempted visit never prompts
    let mut sim = session(RoomId::Lobby);
    let (sx, sy) = sim.projector().project_cell(stall_cell);
    sim.click(sx, sy - 10.0);
    let (fx, fy) = cell_centre(&sim, Cell::new(6, 10));
    sim.click(fx, fy);
    run_frames(&mut sim, 0, 300);
    results.push(TestResult {
        name: "nav_visit_preempted".into(),
        passed: sim.prompt().is_none() && sim.pending_arrival().is_none(),
        detail: "new click cancels the pending arrival".into(),
    });

    results
}

// ── 6. Seating ──────────────────────────────────────────────────────────

fn validate_seating(_verbose: bool) -> Vec<TestResult> {
    println!("--- Seating ---");
    let mut results = Vec::new();

    for id in RoomId::ALL {
        let mut sim = session(id);
        let outcome = sim.toggle_sit();
        run_frames(&mut sim, 0, 600);
        let seated_on = sim.motion().seat();
        results.push(TestResult {
            name: format!("{}_seat_seek", id.name()),
            passed: matches!(outcome, SitOutcome::Seeking(_) | SitOutcome::SatDown(_))
                && sim.motion().is_sitting()
                && seated_on.is_some_and(|s| s.cell() == sim.avatar().cell()),
            detail: format!("{:?}", outcome),
        });
    }

    // Occupied seats are skipped
    let mut sim = session(RoomId::Lobby);
    let seats = sim.layout().seats.clone();
    let taken: Vec<Peer> = seats
        .iter()
        .take(seats.len() - 1)
        .enumerate()
        .map(|(i, s)| Peer::new(format!("p{}", i), "", s.x as f32, s.y as f32))
        .collect();
    let free = seats.last().map(|s| s.cell());
    sim.set_peers(taken);
    let outcome = sim.toggle_sit();
    results.push(TestResult {
        name: "seat_skips_occupied".into(),
        passed: matches!(outcome, SitOutcome::Seeking(s) if Some(s.cell()) == free),
        detail: format!("{:?}", outcome),
    });

    // Every seat taken
    let mut sim = session(RoomId::Lobby);
    let everyone: Vec<Peer> = seats
        .iter()
        .enumerate()
        .map(|(i, s)| Peer::new(format!("p{}", i), "", s.x as f32, s.y as f32))
        .collect();
    sim.set_peers(everyone);
    let outcome = sim.toggle_sit();
    run_frames(&mut sim, 0, 30);
    results.push(TestResult {
        name: "seat_none_free".into(),
        passed: outcome == SitOutcome::NoFreeSeat && sim.avatar().cell() == Cell::new(6, 6),
        detail: "avatar stays put".into(),
    });

    // Double toggle
    let mut sim = session(RoomId::Cafe);
    let before = *sim.avatar();
    sim.toggle_sit();
    sim.toggle_sit();
    results.push(TestResult {
        name: "seat_double_toggle".into(),
        passed: sim.state() == MotionState::Idle
            && (sim.avatar().x, sim.avatar().y) == (before.x, before.y),
        detail: "seek then cancel leaves the avatar idle in place".into(),
    });

    results
}

// ── 7. Peers & Chat ─────────────────────────────────────────────────────

fn validate_social(_verbose: bool) -> Vec<TestResult> {
    println!("--- Peers & Chat ---");
    let mut results = Vec::new();

    let snapshot = r##"[
        { "id": "a", "name": "Ann", "x": 12.0, "y": 12.0, "facing": "E", "color": "#ff8800" },
        { "id": "b", "x": 14.0, "y": 13.0, "sit": true }
    ]"##;
    let peers: Vec<Peer> = match serde_json::from_str(snapshot) {
        Ok(peers) => peers,
        Err(e) => {
            results.push(TestResult {
                name: "peer_snapshot_parses".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "peer_snapshot_parses".into(),
        passed: peers.len() == 2 && peers[0].facing == Facing::East && peers[1].name.is_empty(),
        detail: format!("{} peers, second sitting={}", peers.len(), peers[1].sit),
    });

    let mut sim = session(RoomId::Lobby);
    sim.set_peers(peers);
    let first = sim.tick(FrameInput::new(DT, 16)).avatars().count();
    sim.set_peers(vec![Peer::new("a", "Ann", 15.0, 12.0)]);
    let second = sim.tick(FrameInput::new(DT, 32)).avatars().count();
    results.push(TestResult {
        name: "peers_pruned_next_frame".into(),
        passed: first == 3 && second == 2 && sim.reconciler().get("b").is_none(),
        detail: format!("{} → {} avatars drawn", first, second),
    });

    run_frames(&mut sim, 32, 120);
    let gap = sim.reconciler().get("a").map_or(f32::MAX, |s| (15.0 - s.x).abs());
    results.push(TestResult {
        name: "peers_converge".into(),
        passed: gap < 0.01,
        detail: format!("gap {:.4} tiles after 2 s", gap),
    });

    let feed: Vec<ChatMessage> = (0..15)
        .map(|i| ChatMessage::new(format!("user{}", i), format!("line {}", i), 1_000))
        .collect();
    sim.ingest_chat(&feed, 1_000);
    let live = sim.bubbles().len();
    results.push(TestResult {
        name: "chat_window".into(),
        passed: live == 10 && sim.bubbles().active("user4", 1_000).is_none(),
        detail: format!("{} bubbles from 15 messages", live),
    });

    sim.tick(FrameInput::new(DT, 4_001));
    results.push(TestResult {
        name: "chat_bubbles_expire".into(),
        passed: sim.bubbles().is_empty(),
        detail: "all bubbles gone after 3 s".into(),
    });

    results.push(TestResult {
        name: "chat_commands".into(),
        passed: ChatCommand::parse(" /Sit ") == Some(ChatCommand::Sit)
            && ChatCommand::parse("/wave") == Some(ChatCommand::Wave)
            && ChatCommand::parse("gm farmers") == Some(ChatCommand::Say("gm farmers".into()))
            && ChatCommand::parse("  ").is_none(),
        detail: "slash commands recognised".into(),
    });

    results
}

// ── 8. Random-click Fuzz ────────────────────────────────────────────────

fn fuzz_random_clicks(verbose: bool) -> Vec<TestResult> {
    println!("--- Random-click Fuzz ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(42);

    for id in RoomId::ALL {
        let mut sim = session(id);
        let mut now = 0;
        let mut violations = 0;
        let mut walks = 0;
        let mut prompts = 0;

        for _ in 0..400 {
            let event = match rng.gen_range(0..10) {
                0 => InputEvent::ToggleSit,
                1 => InputEvent::KeyDown(random_key(&mut rng)),
                2 => InputEvent::KeyUp(random_key(&mut rng)),
                3 => InputEvent::DismissVisit,
                _ => InputEvent::PointerClick {
                    x: rng.gen_range(-50.0..VIEW_W + 50.0),
                    y: rng.gen_range(-50.0..VIEW_H + 50.0),
                },
            };
            let frames = rng.gen_range(1..40);
            now += FRAME_MS;
            sim.tick(FrameInput::new(DT, now).with_event(event));
            for _ in 1..frames {
                now += FRAME_MS;
                sim.tick(FrameInput::new(DT, now));
                if !sim.grid().is_walkable_cell(sim.avatar().cell()) {
                    violations += 1;
                }
            }
            if sim.motion().is_moving() {
                walks += 1;
            }
            if sim.prompt().is_some() {
                prompts += 1;
            }
        }
        if verbose {
            println!(
                "    {}: {} frames moving at sample, {} with prompt open",
                id.name(),
                walks,
                prompts
            );
        }
        results.push(TestResult {
            name: format!("{}_fuzz_stays_walkable", id.name()),
            passed: violations == 0,
            detail: format!("{} off-floor frames over {} ms", violations, now),
        });
    }

    results
}

fn random_key(rng: &mut StdRng) -> MoveKey {
    match rng.gen_range(0..4) {
        0 => MoveKey::Up,
        1 => MoveKey::Down,
        2 => MoveKey::Left,
        _ => MoveKey::Right,
    }
}
