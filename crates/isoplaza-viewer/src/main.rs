//! IsoPlaza Viewer - Bevy front end for the room engine
//!
//! Owns the frame loop, turns window/keyboard/pointer input into engine
//! events and rasterises each `RenderFrame` with 2D gizmos and `Text2d`.
//! Runs offline: two wandering demo peers stand in for the transport and
//! outbound events are only logged.

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::window::{CursorLeft, CursorMoved, PrimaryWindow};
use isoplaza_logic::chat::ChatMessage;
use isoplaza_logic::config::EngineConfig;
use isoplaza_logic::facing::Facing;
use isoplaza_logic::grid::Cell;
use isoplaza_logic::input::{InputEvent, MoveKey};
use isoplaza_logic::layout::RoomId;
use isoplaza_logic::palette::{self, Rgba};
use isoplaza_logic::peers::Peer;
use isoplaza_logic::render::{AvatarPose, AvatarSprite, RenderCommand, RenderFrame};
use isoplaza_logic::sim::{FrameInput, OutboundEvent, RoomSimulation};

const PLAYER_NAME: &str = "Farmer";
const BUBBLE_HEIGHT: f32 = 22.0;
const DEMO_PEER_SPEED: f32 = 1.6;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "IsoPlaza - KALE Market".to_string(),
                resolution: (1280.0, 720.0).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(color(palette::SKY_TOP)))
        .insert_resource(RoomWrapper(RoomSimulation::new(
            EngineConfig::default(),
            RoomId::Lobby,
            PLAYER_NAME,
        )))
        .insert_resource(PendingInput::default())
        .insert_resource(ClickTracker::default())
        .insert_resource(ChatBox::default())
        .insert_resource(LastFrame::default())
        .insert_resource(DemoPeers::default())
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                pointer_input,
                keyboard_input,
                drive_demo_peers,
                step_room,
                draw_frame,
                draw_text,
            )
                .chain(),
        )
        .run();
}

#[derive(Resource)]
struct RoomWrapper(RoomSimulation);

/// Events gathered this frame, handed to the next tick.
#[derive(Resource, Default)]
struct PendingInput(Vec<InputEvent>);

#[derive(Resource, Default)]
struct ClickTracker {
    last: Option<(u64, Vec2)>,
}

#[derive(Resource, Default)]
struct ChatBox {
    open: bool,
    draft: String,
    log: Vec<ChatMessage>,
}

#[derive(Resource, Default)]
struct LastFrame(Option<RenderFrame>);

/// Offline stand-ins for remote participants, pacing fixed routes.
#[derive(Resource, Default)]
struct DemoPeers {
    room: Option<RoomId>,
    routes: Vec<DemoRoute>,
    elapsed: f32,
}

struct DemoRoute {
    peer: Peer,
    path: Vec<Cell>,
}

// Marker for text respawned every frame
#[derive(Component)]
struct FrameText;

fn setup(mut commands: Commands, sim: Res<RoomWrapper>) {
    commands.spawn(Camera2d::default());
    info!(
        "Entered {} ({} stalls, {} seats)",
        sim.0.room().title(),
        sim.0.layout().stalls.len(),
        sim.0.layout().seats.len()
    );
}

fn now_ms(time: &Time) -> u64 {
    time.elapsed().as_millis() as u64
}

// ── Input ───────────────────────────────────────────────────────────────

fn pointer_input(
    time: Res<Time>,
    sim: Res<RoomWrapper>,
    mouse: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut moved: EventReader<CursorMoved>,
    mut left: EventReader<CursorLeft>,
    mut tracker: ResMut<ClickTracker>,
    mut pending: ResMut<PendingInput>,
) {
    for ev in moved.read() {
        pending.0.push(InputEvent::PointerMove {
            x: ev.position.x,
            y: ev.position.y,
        });
    }
    if left.read().count() > 0 {
        pending.0.push(InputEvent::PointerLeave);
    }

    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = window_query.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    let now = now_ms(&time);
    pending.0.push(InputEvent::PointerClick {
        x: cursor.x,
        y: cursor.y,
    });
    let window_ms = sim.0.config().double_click_ms;
    match tracker.last {
        Some((at, pos)) if now.saturating_sub(at) <= window_ms && pos.distance(cursor) < 6.0 => {
            pending.0.push(InputEvent::PointerDoubleClick {
                x: cursor.x,
                y: cursor.y,
            });
            tracker.last = None;
        }
        _ => tracker.last = Some((now, cursor)),
    }
}

fn move_key(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(MoveKey::Up),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(MoveKey::Down),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(MoveKey::Right),
        _ => None,
    }
}

fn keyboard_input(
    time: Res<Time>,
    mut keys: EventReader<KeyboardInput>,
    mut sim: ResMut<RoomWrapper>,
    mut chat: ResMut<ChatBox>,
    mut pending: ResMut<PendingInput>,
) {
    for ev in keys.read() {
        if chat.open {
            if ev.state != ButtonState::Pressed {
                continue;
            }
            match &ev.logical_key {
                Key::Enter => {
                    let line = std::mem::take(&mut chat.draft);
                    chat.open = false;
                    pending.0.push(InputEvent::TextFocus(false));
                    if let Some(text) = sim.0.submit_chat(&line) {
                        let now = now_ms(&time);
                        chat.log.push(ChatMessage::new(PLAYER_NAME, text, now));
                        let window = sim.0.config().chat_window;
                        if chat.log.len() > window {
                            let excess = chat.log.len() - window;
                            chat.log.drain(..excess);
                        }
                        sim.0.ingest_chat(&chat.log, now);
                    }
                }
                Key::Escape => {
                    chat.draft.clear();
                    chat.open = false;
                    pending.0.push(InputEvent::TextFocus(false));
                }
                Key::Backspace => {
                    chat.draft.pop();
                }
                Key::Space => chat.draft.push(' '),
                Key::Character(s) => chat.draft.push_str(s.as_str()),
                _ => {}
            }
            continue;
        }

        if let Some(key) = move_key(ev.key_code) {
            match ev.state {
                ButtonState::Pressed if !ev.repeat => pending.0.push(InputEvent::KeyDown(key)),
                ButtonState::Released => pending.0.push(InputEvent::KeyUp(key)),
                _ => {}
            }
            continue;
        }
        if ev.state != ButtonState::Pressed || ev.repeat {
            continue;
        }

        let prompt_open = sim.0.prompt().is_some();
        match ev.key_code {
            KeyCode::Enter | KeyCode::KeyY if prompt_open => pending.0.push(InputEvent::ConfirmVisit),
            KeyCode::Escape | KeyCode::KeyN if prompt_open => pending.0.push(InputEvent::DismissVisit),
            KeyCode::Enter | KeyCode::KeyT => {
                chat.open = true;
                pending.0.push(InputEvent::TextFocus(true));
            }
            KeyCode::KeyX => pending.0.push(InputEvent::ToggleSit),
            KeyCode::KeyQ => {
                sim.0.submit_chat("/wave");
            }
            KeyCode::KeyE => {
                sim.0.submit_chat("/laugh");
            }
            KeyCode::Tab => {
                let next = match sim.0.room() {
                    RoomId::Lobby => RoomId::Cafe,
                    RoomId::Cafe => RoomId::Rooftop,
                    RoomId::Rooftop => RoomId::Lobby,
                };
                sim.0.set_room(next);
                info!("Now in {}", next.title());
            }
            KeyCode::Digit1 => sim.0.set_room(RoomId::Lobby),
            KeyCode::Digit2 => sim.0.set_room(RoomId::Cafe),
            KeyCode::Digit3 => sim.0.set_room(RoomId::Rooftop),
            _ => {}
        }
    }
}

// ── Demo peers ──────────────────────────────────────────────────────────

impl DemoPeers {
    /// Two routes across the current room's walkable floor.
    fn rebuild(&mut self, sim: &RoomSimulation) {
        let grid = sim.grid();
        let open: Vec<Cell> = grid.cells().filter(|&c| grid.is_walkable_cell(c)).collect();
        self.routes.clear();
        self.room = Some(sim.room());
        if open.len() < 4 {
            return;
        }
        let n = open.len();
        let picks = [
            ("demo-sprout", "Sprout", "#3aa655", open[n / 4], open[3 * n / 4]),
            ("demo-basil", "Basil", "#c2410c", open[n / 3], open[2 * n / 3]),
        ];
        for (id, name, color, from, to) in picks {
            let path = grid.find_path(from, to);
            let mut peer = Peer::new(id, name, from.x as f32, from.y as f32);
            peer.color = Some(color.to_string());
            self.routes.push(DemoRoute { peer, path });
        }
    }

    fn advance(&mut self, dt: f32) -> Vec<Peer> {
        self.elapsed += dt;
        let t = self.elapsed * DEMO_PEER_SPEED;
        self.routes
            .iter_mut()
            .map(|route| {
                let segments = route.path.len().saturating_sub(1) as f32;
                if segments > 0.0 {
                    // Ping-pong along the path
                    let s = t % (segments * 2.0);
                    let pos = if s <= segments { s } else { segments * 2.0 - s };
                    let i = (pos.floor() as usize).min(route.path.len() - 2);
                    let frac = pos - i as f32;
                    let (a, b) = (route.path[i], route.path[i + 1]);
                    let (dx, dy) = ((b.x - a.x) as f32, (b.y - a.y) as f32);
                    let dir = if s <= segments { 1.0 } else { -1.0 };
                    route.peer.x = a.x as f32 + dx * frac;
                    route.peer.y = a.y as f32 + dy * frac;
                    route.peer.facing = Facing::from_delta(dx * dir, dy * dir, route.peer.facing);
                }
                route.peer.clone()
            })
            .collect()
    }
}

fn drive_demo_peers(time: Res<Time>, mut demo: ResMut<DemoPeers>, mut sim: ResMut<RoomWrapper>) {
    if demo.room != Some(sim.0.room()) {
        demo.rebuild(&sim.0);
    }
    let peers = demo.advance(time.delta_secs());
    sim.0.set_peers(peers);
}

// ── Frame step ──────────────────────────────────────────────────────────

fn step_room(
    time: Res<Time>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut sim: ResMut<RoomWrapper>,
    mut pending: ResMut<PendingInput>,
    mut last: ResMut<LastFrame>,
) {
    if let Ok(window) = window_query.get_single() {
        sim.0.set_viewport(window.width(), window.height());
    }

    let mut input = FrameInput::new(time.delta_secs(), now_ms(&time));
    input.events = std::mem::take(&mut pending.0);
    last.0 = Some(sim.0.tick(input));

    for event in sim.0.drain_events() {
        match event {
            OutboundEvent::PositionReport { x, y, facing } => {
                debug!("position {:.2},{:.2} {}", x, y, facing.letter());
            }
            OutboundEvent::StallVisit { stall_id, kind } => {
                info!("Visiting {} ({})", stall_id, kind.as_str());
            }
            OutboundEvent::SitChanged(sit) => info!("Sit: {}", sit),
            OutboundEvent::Bubble(text) => info!("Bubble: {}", text),
        }
    }
}

// ── Rasterisation ───────────────────────────────────────────────────────

fn color(c: Rgba) -> Color {
    let [r, g, b, a] = c.to_f32();
    Color::srgba(r, g, b, a)
}

/// Engine pixels (top-left origin, y down) to world space.
fn to_world(view: Vec2, x: f32, y: f32) -> Vec2 {
    Vec2::new(x - view.x / 2.0, view.y / 2.0 - y)
}

fn fill_rect(gizmos: &mut Gizmos, view: Vec2, x: f32, y: f32, w: f32, h: f32, c: Color) {
    let mut dy = 0.0;
    while dy <= h {
        gizmos.line_2d(to_world(view, x, y + dy), to_world(view, x + w, y + dy), c);
        dy += 1.5;
    }
}

/// Diamond with its top vertex at `(x, y)`.
fn fill_diamond(gizmos: &mut Gizmos, view: Vec2, x: f32, y: f32, w: f32, h: f32, c: Color) {
    let mut dy = 0.0;
    while dy <= h {
        let half = if dy <= h / 2.0 { dy / h * w } else { (h - dy) / h * w };
        gizmos.line_2d(to_world(view, x - half, y + dy), to_world(view, x + half, y + dy), c);
        dy += 1.5;
    }
}

fn outline_diamond(gizmos: &mut Gizmos, view: Vec2, x: f32, y: f32, w: f32, h: f32, c: Color) {
    gizmos.linestrip_2d(
        [
            to_world(view, x, y),
            to_world(view, x + w / 2.0, y + h / 2.0),
            to_world(view, x, y + h),
            to_world(view, x - w / 2.0, y + h / 2.0),
            to_world(view, x, y),
        ],
        c,
    );
}

fn fill_disc(gizmos: &mut Gizmos, view: Vec2, x: f32, y: f32, r: f32, c: Color) {
    let mut dy = -r;
    while dy <= r {
        let half = (r * r - dy * dy).max(0.0).sqrt();
        gizmos.line_2d(to_world(view, x - half, y + dy), to_world(view, x + half, y + dy), c);
        dy += 1.0;
    }
}

fn draw_frame(
    last: Res<LastFrame>,
    sim: Res<RoomWrapper>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut gizmos: Gizmos,
) {
    let Some(frame) = &last.0 else {
        return;
    };
    let Ok(window) = window_query.get_single() else {
        return;
    };
    let view = Vec2::new(window.width(), window.height());

    for cmd in &frame.commands {
        match cmd {
            // Covered by the camera clear colour
            RenderCommand::Clear { .. } => {}
            RenderCommand::SkyGradient {
                width,
                height,
                top,
                bottom,
            } => {
                let (a, b) = (top.to_f32(), bottom.to_f32());
                let mut y = 0.0;
                while y <= *height {
                    let t = y / height.max(1.0);
                    let mix = |i: usize| a[i] + (b[i] - a[i]) * t;
                    let c = Color::srgba(mix(0), mix(1), mix(2), mix(3));
                    gizmos.line_2d(to_world(view, 0.0, y), to_world(view, *width, y), c);
                    y += 3.0;
                }
            }
            RenderCommand::Cloud {
                x,
                y,
                width,
                height,
                alpha,
            } => {
                let c = color(palette::CLOUD.with_alpha(*alpha));
                let (cx, cy) = (x + width / 2.0, y + height / 2.0);
                let (rx, ry) = (width / 2.0, height / 2.0);
                let mut dy = -ry;
                while dy <= ry {
                    let half = rx * (1.0 - (dy / ry).powi(2)).max(0.0).sqrt();
                    gizmos.line_2d(to_world(view, cx - half, cy + dy), to_world(view, cx + half, cy + dy), c);
                    dy += 2.0;
                }
            }
            RenderCommand::Bird { x, y } => {
                gizmos.linestrip_2d(
                    [
                        to_world(view, x - 6.0, y - 3.0),
                        to_world(view, *x, *y),
                        to_world(view, x + 6.0, y - 3.0),
                    ],
                    color(palette::BIRD),
                );
            }
            RenderCommand::Tile {
                x,
                y,
                width,
                height,
                fill,
                outline,
            } => {
                fill_diamond(&mut gizmos, view, *x, *y, *width, *height, color(*fill));
                outline_diamond(&mut gizmos, view, *x, *y, *width, *height, color(*outline));
            }
            RenderCommand::RaisedBlock {
                x,
                y,
                width,
                height,
                lift,
                top,
                side,
                outline,
            } => {
                let top_y = y - lift;
                let half_w = width / 2.0;
                // Side faces hang below the two lower edges
                let mut sx = -half_w;
                while sx <= half_w {
                    let edge = top_y + height / 2.0 + (half_w - sx.abs()) / half_w * height / 2.0;
                    let c = if sx < 0.0 { color(*side) } else { color(side.shade(-10.0)) };
                    gizmos.line_2d(to_world(view, x + sx, edge), to_world(view, x + sx, edge + lift), c);
                    sx += 1.5;
                }
                fill_diamond(&mut gizmos, view, *x, top_y, *width, *height, color(*top));
                outline_diamond(&mut gizmos, view, *x, top_y, *width, *height, color(*outline));
            }
            RenderCommand::Glow { x, y, radius, color: c } => {
                let mut r = *radius;
                while r > 1.0 {
                    let a = c.to_f32()[3] * (1.0 - r / radius).max(0.15);
                    gizmos.circle_2d(
                        Isometry2d::from_translation(to_world(view, *x, *y)),
                        r,
                        color(c.with_alpha(a)),
                    );
                    r -= 2.0;
                }
            }
            RenderCommand::Dot { x, y, radius, color: c } => {
                fill_disc(&mut gizmos, view, *x, *y, *radius, color(*c));
            }
            RenderCommand::Avatar(sprite) => draw_avatar(&mut gizmos, view, sprite),
            RenderCommand::Bubble { x, y, width, .. } => {
                let top = y - 8.0 - BUBBLE_HEIGHT;
                fill_rect(&mut gizmos, view, x - width / 2.0, top, *width, BUBBLE_HEIGHT, color(palette::PAPER));
                gizmos.rect_2d(
                    Isometry2d::from_translation(to_world(view, *x, top + BUBBLE_HEIGHT / 2.0)),
                    Vec2::new(*width, BUBBLE_HEIGHT),
                    color(palette::INK),
                );
                gizmos.linestrip_2d(
                    [
                        to_world(view, x - 4.0, y - 8.0),
                        to_world(view, *x, y - 2.0),
                        to_world(view, x + 4.0, y - 8.0),
                    ],
                    color(palette::INK),
                );
            }
            RenderCommand::Nameplate { rect, .. } => {
                fill_rect(&mut gizmos, view, rect.x, rect.y, rect.w, rect.h, color(palette::INK.with_alpha(0.85)));
            }
            RenderCommand::Glyph { .. } => {}
        }
    }

    if sim.0.prompt().is_some() {
        let (w, h) = (440.0, 110.0);
        let (x, y) = ((view.x - w) / 2.0, (view.y - h) / 2.0 - 5.0);
        fill_rect(&mut gizmos, view, x, y, w, h, color(palette::INK.with_alpha(0.85)));
        gizmos.rect_2d(
            Isometry2d::from_translation(to_world(view, x + w / 2.0, y + h / 2.0)),
            Vec2::new(w, h),
            color(palette::SIGN_AMBER),
        );
    }
}

fn draw_avatar(gizmos: &mut Gizmos, view: Vec2, s: &AvatarSprite) {
    let (x, y) = (s.x, s.y);
    let sink = if s.pose == AvatarPose::Sitting { 5.0 } else { 0.0 };
    let legs = color(palette::AVATAR_LEGS);

    // Legs
    match s.pose {
        AvatarPose::Sitting => {
            let (fx, fy) = s.facing.step();
            let (ox, oy) = ((fx - fy) as f32 * 4.0, (fx + fy) as f32 * 2.0);
            for side in [-3.0, 3.0] {
                gizmos.line_2d(
                    to_world(view, x + side, y + sink - 2.0),
                    to_world(view, x + side + ox, y + sink + 2.0 + oy),
                    legs,
                );
            }
        }
        AvatarPose::Walking | AvatarPose::Standing => {
            let swing = if s.pose == AvatarPose::Walking {
                (s.anim * 2.0).sin() * 2.5
            } else {
                0.0
            };
            gizmos.line_2d(to_world(view, x - 3.0, y - 2.0), to_world(view, x - 3.0 + swing, y + 8.0), legs);
            gizmos.line_2d(to_world(view, x + 3.0, y - 2.0), to_world(view, x + 3.0 - swing, y + 8.0), legs);
        }
    }

    // Torso and arms
    let body_top = y - 16.0 + sink;
    fill_rect(gizmos, view, x - 6.0, body_top, 12.0, 14.0, color(s.shirt));
    let skin = color(palette::AVATAR_SKIN);
    gizmos.line_2d(to_world(view, x - 6.0, body_top + 2.0), to_world(view, x - 8.0, body_top + 11.0), skin);
    if s.wave {
        let wobble = (s.anim * 6.0).sin() * 3.0;
        gizmos.line_2d(
            to_world(view, x + 6.0, body_top + 2.0),
            to_world(view, x + 10.0 + wobble, body_top - 9.0),
            skin,
        );
    } else {
        gizmos.line_2d(to_world(view, x + 6.0, body_top + 2.0), to_world(view, x + 8.0, body_top + 11.0), skin);
    }

    // Head
    let head_y = body_top - 6.0;
    fill_disc(gizmos, view, x, head_y, 6.0, skin);
    let hair = color(palette::AVATAR_HAIR);
    let hair_rows = if s.facing == Facing::North { 6 } else { 3 };
    for i in 0..hair_rows {
        let dy = -6.0 + i as f32 * 1.5;
        let half = (36.0 - dy * dy).max(0.0).sqrt();
        gizmos.line_2d(to_world(view, x - half, head_y + dy), to_world(view, x + half, head_y + dy), hair);
    }
    let eye = color(palette::INK);
    let eyes: &[f32] = match s.facing {
        Facing::South => &[-2.0, 2.0],
        Facing::East => &[3.0],
        Facing::West => &[-3.0],
        Facing::North => &[],
    };
    for ex in eyes {
        fill_disc(gizmos, view, x + ex, head_y, 0.8, eye);
    }
    if s.laugh {
        gizmos.line_2d(to_world(view, x - 2.0, head_y + 3.0), to_world(view, x + 2.0, head_y + 3.0), eye);
    }
}

// ── Text ────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn spawn_label(commands: &mut Commands, view: Vec2, x: f32, y: f32, z: f32, size: f32, text: &str, c: Color) {
    let pos = to_world(view, x, y);
    commands.spawn((
        Text2d::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(c),
        Transform::from_xyz(pos.x, pos.y, z),
        FrameText,
    ));
}

fn draw_text(
    mut commands: Commands,
    old: Query<Entity, With<FrameText>>,
    last: Res<LastFrame>,
    sim: Res<RoomWrapper>,
    chat: Res<ChatBox>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) {
    for e in &old {
        commands.entity(e).despawn();
    }
    let Some(frame) = &last.0 else {
        return;
    };
    let Ok(window) = window_query.get_single() else {
        return;
    };
    let view = Vec2::new(window.width(), window.height());

    for (i, cmd) in frame.commands.iter().enumerate() {
        let z = 10.0 + i as f32 * 0.001;
        match cmd {
            RenderCommand::Glyph {
                x,
                y,
                size,
                text,
                color: c,
            } => spawn_label(&mut commands, view, *x, *y, z, *size, text, color(*c)),
            RenderCommand::Bubble { x, y, text, .. } => {
                let cy = y - 8.0 - BUBBLE_HEIGHT / 2.0;
                spawn_label(&mut commands, view, *x, cy, z, 12.0, text, color(palette::INK));
            }
            RenderCommand::Nameplate { rect, text } => {
                let (cx, cy) = (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
                spawn_label(&mut commands, view, cx, cy, z, 12.0, text, color(palette::PAPER));
            }
            RenderCommand::Avatar(s) if s.laugh => {
                spawn_label(&mut commands, view, s.x + 12.0, s.head_y() - 6.0, z, 11.0, "ha!", color(palette::INK));
            }
            _ => {}
        }
    }

    // HUD
    let white = Color::WHITE;
    spawn_label(&mut commands, view, 110.0, 20.0, 50.0, 18.0, sim.0.room().title(), white);
    let hint = if chat.open {
        format!("> {}_", chat.draft)
    } else {
        "Click or WASD to walk · X sit · Q wave · E laugh · T chat · Tab room".to_string()
    };
    spawn_label(&mut commands, view, view.x / 2.0, view.y - 20.0, 50.0, 14.0, &hint, white);

    if let Some(prompt) = sim.0.prompt() {
        let (cx, cy) = (view.x / 2.0, view.y / 2.0);
        spawn_label(&mut commands, view, cx, cy - 24.0, 60.0, 22.0, &prompt.heading(), white);
        spawn_label(&mut commands, view, cx, cy + 4.0, 60.0, 14.0, prompt.description(), white);
        spawn_label(&mut commands, view, cx, cy + 30.0, 60.0, 13.0, "Enter: visit   Esc: close", white);
    }
}
