//! Per-frame render command list.
//!
//! [`compose`] walks the room once per frame and emits draw commands in
//! painter's order:
//!
//! | Pass | Driven by |
//! |------|-----------|
//! | Sky, back clouds, birds | background clock only |
//! | Floor tiles | grid walkability, checkerboard tint |
//! | Wall blocks | north and west border edges |
//! | Decorations, stalls | layout table, gameplay clock; fills the stall registry |
//! | Peers | smoothed positions, sorted by y |
//! | Local avatar | motion controller, walk bob |
//! | Front clouds | background clock, low alpha |
//! | Nameplate | hovered avatar only, collision-resolved |
//!
//! Commands carry screen-space coordinates so a rasteriser only has to draw
//! shapes and text.

use crate::chat::BubbleBoard;
use crate::clock::AnimationClock;
use crate::config::EngineConfig;
use crate::facing::Facing;
use crate::grid::Grid;
use crate::interaction::{HoverTarget, StallHitBox, StallRegistry};
use crate::iso::{IsoProjector, Viewport};
use crate::layout::{Decoration, RoomLayout, StallKind};
use crate::motion::Avatar;
use crate::palette::{self, Rgba};
use crate::peers::{Peer, PeerReconciler};

/// Hover id of the local avatar.
pub const LOCAL_AVATAR_ID: &str = "@local";

/// Head anchor above the avatar's foot point.
pub const HEAD_OFFSET: f32 = 26.0;
/// Bubble anchor above the foot point; sitting lifts it a further 6 px.
pub const BUBBLE_OFFSET: f32 = 28.0;
pub const SITTING_BUBBLE_LIFT: f32 = 6.0;
/// Height of a raised wall block.
pub const WALL_LIFT: f32 = 8.0;

const ICON_SIZE: f32 = 48.0;
const LABEL_SIZE: f32 = 12.0;
const SIGN_SIZE: f32 = 8.0;
const PARTICLE_SIZE: f32 = 12.0;
const NAMEPLATE_HEIGHT: f32 = 18.0;
const NAMEPLATE_MIN_WIDTH: f32 = 24.0;
const NAMEPLATE_PAD_X: f32 = 6.0;
const BUBBLE_PAD_X: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarPose {
    Standing,
    Walking,
    Sitting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvatarSprite {
    /// Foot point in screen pixels, bob already applied.
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub pose: AvatarPose,
    pub shirt: Rgba,
    pub wave: bool,
    pub laugh: bool,
    /// Gameplay clock, for limb swing.
    pub anim: f32,
}

impl AvatarSprite {
    pub fn head_y(&self) -> f32 {
        self.y - HEAD_OFFSET
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Clear {
        width: f32,
        height: f32,
    },
    SkyGradient {
        width: f32,
        height: f32,
        top: Rgba,
        bottom: Rgba,
    },
    /// Soft cloud; `(x, y)` is the top-left of its bounding box.
    Cloud {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        alpha: f32,
    },
    Bird {
        x: f32,
        y: f32,
    },
    /// Diamond whose top vertex is `(x, y)`.
    Tile {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgba,
        outline: Rgba,
    },
    /// Tile lifted by `lift` px with two shaded side faces.
    RaisedBlock {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        lift: f32,
        top: Rgba,
        side: Rgba,
        outline: Rgba,
    },
    Glow {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgba,
    },
    /// Text or emoji centred on `(x, y)`.
    Glyph {
        x: f32,
        y: f32,
        size: f32,
        text: String,
        color: Rgba,
    },
    Dot {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgba,
    },
    Avatar(AvatarSprite),
    /// Speech bubble whose tail tip is 8 px above `(x, y)`.
    Bubble {
        x: f32,
        y: f32,
        width: f32,
        text: String,
    },
    Nameplate {
        rect: LabelRect,
        text: String,
    },
}

/// Screen-space rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl LabelRect {
    /// Touching edges count as overlap.
    pub fn intersects(&self, other: &LabelRect) -> bool {
        !(self.x + self.w < other.x
            || other.x + other.w < self.x
            || self.y + self.h < other.y
            || other.y + other.h < self.y)
    }
}

/// Output of one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderFrame {
    pub frame: u64,
    pub viewport: Option<Viewport>,
    pub commands: Vec<RenderCommand>,
    /// Heads drawn this frame, for hover picking.
    pub hover_targets: Vec<HoverTarget>,
}

impl RenderFrame {
    pub fn avatars(&self) -> impl Iterator<Item = &AvatarSprite> {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Avatar(a) => Some(a),
            _ => None,
        })
    }

    pub fn bubbles(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Bubble { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// The local avatar as the renderer needs it.
#[derive(Debug, Clone, Copy)]
pub struct LocalView<'a> {
    pub avatar: &'a Avatar,
    pub name: &'a str,
    pub sitting: bool,
    /// Walking along a path or holding a movement key.
    pub active: bool,
    pub wave: bool,
    pub laugh: bool,
}

/// Everything one frame reads.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub viewport: Viewport,
    pub projector: &'a IsoProjector,
    pub grid: &'a Grid,
    pub layout: &'a RoomLayout,
    pub config: &'a EngineConfig,
    pub clock: &'a AnimationClock,
    pub peers: &'a [Peer],
    pub smoothed: &'a PeerReconciler,
    pub bubbles: &'a BubbleBoard,
    pub now_ms: u64,
    pub local: LocalView<'a>,
    pub hovered: Option<&'a str>,
}

/// Rough pixel width of `text` at `size` px. Wide glyphs count double.
pub fn estimate_text_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| if c.is_ascii() { 0.58 } else { 1.0 })
        .sum::<f32>()
        * size
}

/// Build the command list for one frame and rebuild the stall registry.
pub fn compose(scene: &Scene<'_>, registry: &mut StallRegistry, frame: u64) -> RenderFrame {
    let mut out = RenderFrame {
        frame,
        viewport: Some(scene.viewport),
        commands: Vec::with_capacity(scene.grid.len() + 64),
        hover_targets: Vec::new(),
    };
    let bg = scene.clock.background();
    let w = scene.viewport.width;
    let h = scene.viewport.height;

    out.commands.push(RenderCommand::Clear {
        width: w,
        height: h,
    });
    push_sky(&mut out.commands, w, h, bg);
    push_back_clouds(&mut out.commands, w, bg);
    push_birds(&mut out.commands, w, bg);

    push_floor(&mut out.commands, scene);
    push_walls(&mut out.commands, scene);
    push_decorations(&mut out.commands, scene);
    push_stalls(&mut out.commands, scene, registry, frame);

    push_peers(&mut out, scene);
    push_local(&mut out, scene);

    push_front_clouds(&mut out.commands, w, bg);

    if let Some(id) = scene.hovered {
        let hovered: Vec<HoverTarget> = out
            .hover_targets
            .iter()
            .filter(|t| t.id == id)
            .cloned()
            .collect();
        let plates = layout_nameplates(
            &hovered,
            scene.config.nameplate_retries,
            scene.config.nameplate_step,
        );
        for (rect, text) in plates {
            out.commands.push(RenderCommand::Nameplate { rect, text });
        }
    }

    out
}

fn push_sky(cmds: &mut Vec<RenderCommand>, w: f32, h: f32, t: f32) {
    let p = ((t * 0.3).sin() + 1.0) / 2.0;
    let bottom = Rgba::rgb(
        (150.0 + 25.0 * p).round() as u8,
        (190.0 + 18.0 * p).round() as u8,
        (215.0 + 8.0 * p).round() as u8,
    );
    cmds.push(RenderCommand::SkyGradient {
        width: w,
        height: h,
        top: palette::SKY_TOP,
        bottom,
    });
}

fn push_back_clouds(cmds: &mut Vec<RenderCommand>, w: f32, t: f32) {
    for i in 0..4 {
        let i = i as f32;
        let speed = 3.0 + i * 1.2;
        let x = (t * speed * 8.0).rem_euclid(w + 260.0) - 260.0 + i * 90.0;
        cmds.push(RenderCommand::Cloud {
            x,
            y: 30.0 + i * 16.0,
            width: 110.0,
            height: 28.0,
            alpha: 0.85,
        });
    }
}

fn push_birds(cmds: &mut Vec<RenderCommand>, w: f32, t: f32) {
    for i in 0..4 {
        let i = i as f32;
        let x = (t * 25.0 + i * 160.0).rem_euclid(w + 80.0) - 80.0;
        let y = 70.0 + (t * 0.9 + i).sin() * 6.0 + i * 7.0;
        cmds.push(RenderCommand::Bird { x, y });
    }
}

fn push_front_clouds(cmds: &mut Vec<RenderCommand>, w: f32, t: f32) {
    for i in 0..3 {
        let i = i as f32;
        let speed = 2.0 + i * 0.7;
        let x = (t * speed * 6.0).rem_euclid(w + 320.0) - 320.0 + i * 120.0;
        cmds.push(RenderCommand::Cloud {
            x,
            y: 40.0 + i * 22.0,
            width: 130.0,
            height: 34.0,
            alpha: 0.30,
        });
    }
}

fn push_floor(cmds: &mut Vec<RenderCommand>, scene: &Scene<'_>) {
    let p = scene.projector;
    for cell in scene.grid.cells() {
        let (x, y) = p.project_cell(cell);
        let fill = if scene.grid.is_walkable_cell(cell) {
            if (cell.x + cell.y) % 2 == 0 {
                palette::TILE_A
            } else {
                palette::TILE_B
            }
        } else {
            palette::BLOCK
        };
        cmds.push(RenderCommand::Tile {
            x,
            y,
            width: p.tile_width(),
            height: p.tile_height(),
            fill,
            outline: palette::OUTLINE,
        });
    }
}

/// Raised blocks along row 0 and column 0, the two edges facing the viewer.
fn push_walls(cmds: &mut Vec<RenderCommand>, scene: &Scene<'_>) {
    let p = scene.projector;
    let wall = |x: i32, y: i32| {
        let (px, py) = p.project(x as f32, y as f32);
        RenderCommand::RaisedBlock {
            x: px,
            y: py,
            width: p.tile_width(),
            height: p.tile_height(),
            lift: WALL_LIFT,
            top: palette::WALL_TOP,
            side: palette::WALL_SIDE,
            outline: palette::OUTLINE,
        }
    };
    for x in 0..scene.grid.cols() {
        cmds.push(wall(x, 0));
    }
    for y in 1..scene.grid.rows() {
        cmds.push(wall(0, y));
    }
}

fn push_decorations(cmds: &mut Vec<RenderCommand>, scene: &Scene<'_>) {
    let p = scene.projector;
    for deco in &scene.layout.decorations {
        match *deco {
            Decoration::CropPlot { x, y } => {
                let (px, py) = p.project(x as f32, y as f32);
                cmds.push(RenderCommand::Tile {
                    x: px,
                    y: py,
                    width: p.tile_width(),
                    height: p.tile_height(),
                    fill: palette::SOIL,
                    outline: palette::OUTLINE,
                });
                cmds.push(RenderCommand::Dot {
                    x: px,
                    y: py - 4.0,
                    radius: 3.0,
                    color: palette::SPROUT,
                });
            }
        }
    }
}

/// Rebuild the stall registry for `frame` from the current projection.
pub fn register_stalls(
    layout: &RoomLayout,
    projector: &IsoProjector,
    config: &EngineConfig,
    registry: &mut StallRegistry,
    frame: u64,
) {
    registry.begin_frame(frame);
    for stall in &layout.stalls {
        let (px, py) = projector.project_cell(stall.cell());
        registry.register(StallHitBox {
            stall_id: stall.id.clone(),
            kind: stall.kind,
            cell: stall.cell(),
            screen_x: px,
            screen_y: py - config.stall_hit_raise,
            width: config.stall_hit_width,
            height: config.stall_hit_height,
        });
    }
}

fn push_stalls(
    cmds: &mut Vec<RenderCommand>,
    scene: &Scene<'_>,
    registry: &mut StallRegistry,
    frame: u64,
) {
    let p = scene.projector;
    let t = scene.clock.gameplay();
    register_stalls(scene.layout, p, scene.config, registry, frame);

    for stall in &scene.layout.stalls {
        let (px, py) = p.project_cell(stall.cell());

        if stall.kind.is_featured() {
            let gi = ((t * 3.0).sin() + 1.0) / 2.0;
            let color = if stall.kind == StallKind::Produce {
                palette::GLOW_PRODUCE
            } else {
                palette::GLOW_TRADING
            };
            cmds.push(RenderCommand::Glow {
                x: px,
                y: py - 10.0,
                radius: 15.0 + gi * 8.0,
                color: color.with_alpha(0.3 + gi * 0.2),
            });
            for i in 0..3 {
                let fi = i as f32;
                let angle = (t * 0.5 + fi * std::f32::consts::TAU / 3.0) % std::f32::consts::TAU;
                let r = 25.0 + (t * 2.0 + fi).sin() * 5.0;
                cmds.push(RenderCommand::Glyph {
                    x: px + angle.cos() * r,
                    y: py - 10.0 + angle.sin() * r * 0.5 - (t * 4.0 + fi).sin().abs() * 10.0,
                    size: PARTICLE_SIZE,
                    text: stall.kind.particle_glyph().to_string(),
                    color: palette::INK,
                });
            }
        }

        let sway = (t * 2.0 + stall.x as f32 + stall.y as f32).sin() * 1.5;
        cmds.push(RenderCommand::Glyph {
            x: px,
            y: py - 10.0 + sway,
            size: ICON_SIZE,
            text: stall.icon.clone(),
            color: palette::INK,
        });
        cmds.push(RenderCommand::Glyph {
            x: px,
            y: py + 20.0,
            size: LABEL_SIZE,
            text: stall.label.clone(),
            color: palette::INK,
        });
        if stall.kind == StallKind::General {
            cmds.push(RenderCommand::Glyph {
                x: px,
                y: py + 35.0,
                size: SIGN_SIZE,
                text: "COMING SOON".to_string(),
                color: palette::SIGN_AMBER,
            });
        }
    }
}

fn bubble(x: f32, y: f32, text: &str) -> RenderCommand {
    RenderCommand::Bubble {
        x,
        y,
        width: (estimate_text_width(text, LABEL_SIZE) + BUBBLE_PAD_X * 2.0)
            .max(NAMEPLATE_MIN_WIDTH),
        text: text.to_string(),
    }
}

fn push_peers(out: &mut RenderFrame, scene: &Scene<'_>) {
    let t = scene.clock.gameplay();
    for (peer, s) in scene.smoothed.depth_sorted(scene.peers) {
        let (px, py) = scene.projector.project(s.x, s.y);
        let sprite = AvatarSprite {
            x: px,
            y: py,
            facing: s.facing,
            pose: if peer.sit {
                AvatarPose::Sitting
            } else {
                AvatarPose::Standing
            },
            shirt: peer.shirt(),
            wave: peer.wave,
            laugh: peer.laugh,
            anim: t,
        };
        out.hover_targets.push(HoverTarget {
            id: peer.id.clone(),
            name: peer.display_name().to_string(),
            x: px,
            y_head: sprite.head_y(),
        });
        out.commands.push(RenderCommand::Avatar(sprite));

        if let Some(b) = scene.bubbles.active(peer.display_name(), scene.now_ms) {
            let lift = if peer.sit { -SITTING_BUBBLE_LIFT } else { 0.0 };
            out.commands.push(bubble(px, py - BUBBLE_OFFSET + lift, &b.text));
        }
    }
}

/// Vertical bob of the local avatar.
pub fn local_bob(anim: f32, sitting: bool, active: bool) -> f32 {
    if sitting {
        return 0.0;
    }
    (anim * 2.2).sin() * if active { 1.5 } else { 0.6 }
}

fn push_local(out: &mut RenderFrame, scene: &Scene<'_>) {
    let local = &scene.local;
    let t = scene.clock.gameplay();
    let (ax, ay) = scene.projector.project(local.avatar.x, local.avatar.y);
    let bob = local_bob(t, local.sitting, local.active);
    let pose = if local.sitting {
        AvatarPose::Sitting
    } else if local.active {
        AvatarPose::Walking
    } else {
        AvatarPose::Standing
    };
    let sprite = AvatarSprite {
        x: ax,
        y: ay + bob,
        facing: local.avatar.facing,
        pose,
        shirt: palette::AVATAR_SHIRT,
        wave: local.wave,
        laugh: local.laugh,
        anim: t,
    };
    out.hover_targets.push(HoverTarget {
        id: LOCAL_AVATAR_ID.to_string(),
        name: local.name.to_string(),
        x: ax,
        y_head: sprite.head_y(),
    });
    out.commands.push(RenderCommand::Avatar(sprite));

    if let Some(b) = scene.bubbles.active(local.name, scene.now_ms) {
        let lift = if local.sitting { -SITTING_BUBBLE_LIFT } else { bob };
        out.commands.push(bubble(ax, ay - BUBBLE_OFFSET + lift, &b.text));
    }
}

/// Place nameplates above heads, nudging each up by `step` px until it
/// clears every plate already placed. Labels that still collide after
/// `retries` attempts are dropped.
pub fn layout_nameplates(
    labels: &[HoverTarget],
    retries: u32,
    step: f32,
) -> Vec<(LabelRect, String)> {
    let mut placed: Vec<(LabelRect, String)> = Vec::with_capacity(labels.len());
    for label in labels {
        let w = (estimate_text_width(&label.name, LABEL_SIZE) + NAMEPLATE_PAD_X * 2.0)
            .max(NAMEPLATE_MIN_WIDTH);
        let h = NAMEPLATE_HEIGHT;
        let mut rect = LabelRect {
            x: (label.x - w / 2.0).round(),
            y: (label.y_head - 12.0 - h).round(),
            w,
            h,
        };
        for _ in 0..retries {
            if !placed.iter().any(|(r, _)| rect.intersects(r)) {
                placed.push((rect, label.name.clone()));
                break;
            }
            rect.y -= step;
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RoomId;

    struct Fixture {
        layout: RoomLayout,
        grid: Grid,
        config: EngineConfig,
        projector: IsoProjector,
        clock: AnimationClock,
        reconciler: PeerReconciler,
        bubbles: BubbleBoard,
        avatar: Avatar,
    }

    impl Fixture {
        fn new(room: RoomId) -> Self {
            let layout = RoomLayout::preset(room);
            let grid = Grid::from_layout(&layout);
            let config = EngineConfig::default();
            let vp = Viewport::new(1280.0, 720.0);
            let projector = IsoProjector::centered(
                vp,
                grid.cols(),
                grid.rows(),
                config.tile_width,
                config.tile_height,
                6.0,
            );
            let avatar = Avatar::at(layout.spawn, layout.spawn_facing);
            Self {
                clock: AnimationClock::new(&config),
                reconciler: PeerReconciler::new(config.peer_smoothing_rate),
                bubbles: BubbleBoard::new(),
                layout,
                grid,
                config,
                projector,
                avatar,
            }
        }

        fn scene<'a>(&'a self, peers: &'a [Peer], hovered: Option<&'a str>) -> Scene<'a> {
            Scene {
                viewport: Viewport::new(1280.0, 720.0),
                projector: &self.projector,
                grid: &self.grid,
                layout: &self.layout,
                config: &self.config,
                clock: &self.clock,
                peers,
                smoothed: &self.reconciler,
                bubbles: &self.bubbles,
                now_ms: 1_000,
                local: LocalView {
                    avatar: &self.avatar,
                    name: "me",
                    sitting: false,
                    active: false,
                    wave: false,
                    laugh: false,
                },
                hovered,
            }
        }
    }

    fn kind_index(cmds: &[RenderCommand], pred: impl Fn(&RenderCommand) -> bool) -> Option<usize> {
        cmds.iter().position(pred)
    }

    #[test]
    fn test_pass_order() {
        let fx = Fixture::new(RoomId::Lobby);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&[], None), &mut reg, 1);
        let c = &frame.commands;
        assert!(matches!(c[0], RenderCommand::Clear { .. }));
        assert!(matches!(c[1], RenderCommand::SkyGradient { .. }));
        let first_tile = kind_index(c, |c| matches!(c, RenderCommand::Tile { .. })).unwrap();
        let first_wall = kind_index(c, |c| matches!(c, RenderCommand::RaisedBlock { .. })).unwrap();
        let first_bird = kind_index(c, |c| matches!(c, RenderCommand::Bird { .. })).unwrap();
        let avatar = kind_index(c, |c| matches!(c, RenderCommand::Avatar(_))).unwrap();
        assert!(first_bird < first_tile);
        assert!(first_tile < first_wall);
        assert!(first_wall < avatar);
        // Front clouds come after the avatar
        assert!(matches!(c[c.len() - 1], RenderCommand::Cloud { .. }));
    }

    #[test]
    fn test_one_tile_per_cell() {
        let fx = Fixture::new(RoomId::Cafe);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&[], None), &mut reg, 1);
        let tiles = frame
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Tile { .. }))
            .count();
        assert_eq!(tiles, fx.grid.len());
        let walls = frame
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::RaisedBlock { .. }))
            .count();
        assert_eq!(walls as i32, fx.grid.cols() + fx.grid.rows() - 1);
    }

    #[test]
    fn test_registry_rebuilt_each_frame() {
        let fx = Fixture::new(RoomId::Lobby);
        let mut reg = StallRegistry::new();
        compose(&fx.scene(&[], None), &mut reg, 1);
        assert_eq!(reg.boxes().len(), fx.layout.stalls.len());
        compose(&fx.scene(&[], None), &mut reg, 2);
        assert_eq!(reg.boxes().len(), fx.layout.stalls.len());
        assert!(reg.is_current(2));

        let stall = &fx.layout.stalls[0];
        let (px, py) = fx.projector.project_cell(stall.cell());
        let hit = reg.hit_test(px, py - 10.0, 2).unwrap();
        assert_eq!(hit.stall_id, stall.id);
    }

    #[test]
    fn test_featured_stalls_glow() {
        let fx = Fixture::new(RoomId::Rooftop);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&[], None), &mut reg, 1);
        let glows = frame
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Glow { .. }))
            .count();
        let featured = fx.layout.stalls.iter().filter(|s| s.kind.is_featured()).count();
        assert_eq!(glows, featured);
        assert!(featured >= 2);
    }

    #[test]
    fn test_coming_soon_only_on_general() {
        let fx = Fixture::new(RoomId::Lobby);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&[], None), &mut reg, 1);
        let signs = frame
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Glyph { text, .. } if text == "COMING SOON"))
            .count();
        let general = fx
            .layout
            .stalls
            .iter()
            .filter(|s| s.kind == StallKind::General)
            .count();
        assert_eq!(signs, general);
    }

    #[test]
    fn test_peers_depth_sorted_then_local() {
        let mut fx = Fixture::new(RoomId::Lobby);
        let peers = vec![Peer::new("near", "Near", 5.0, 12.0), Peer::new("far", "Far", 5.0, 3.0)];
        fx.reconciler.reconcile(&peers, 0.016);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&peers, None), &mut reg, 1);
        let ids: Vec<&str> = frame.hover_targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["far", "near", LOCAL_AVATAR_ID]);
        assert_eq!(frame.avatars().count(), 3);
    }

    #[test]
    fn test_bubbles_follow_board() {
        let mut fx = Fixture::new(RoomId::Lobby);
        let peers = vec![Peer::new("p", "Ann", 5.0, 12.0)];
        fx.reconciler.reconcile(&peers, 0.016);
        fx.bubbles.post("Ann", "hello", 500, 3_000);
        fx.bubbles.post("me", ":)", 900, 2_000);
        fx.bubbles.post("Ghost", "boo", 900, 2_000);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&peers, None), &mut reg, 1);
        let texts: Vec<&str> = frame.bubbles().collect();
        assert_eq!(texts, ["hello", ":)"]);
    }

    #[test]
    fn test_only_hovered_nameplate() {
        let mut fx = Fixture::new(RoomId::Lobby);
        let peers = vec![Peer::new("p", "", 5.0, 12.0)];
        fx.reconciler.reconcile(&peers, 0.016);
        let mut reg = StallRegistry::new();
        let frame = compose(&fx.scene(&peers, Some("p")), &mut reg, 1);
        let plates: Vec<&str> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Nameplate { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(plates, ["Guest"]);

        let none = compose(&fx.scene(&peers, None), &mut reg, 2);
        assert!(!none.commands.iter().any(|c| matches!(c, RenderCommand::Nameplate { .. })));
    }

    #[test]
    fn test_nameplates_resolve_collisions() {
        let labels = vec![
            HoverTarget {
                id: "a".into(),
                name: "Ann".into(),
                x: 100.0,
                y_head: 200.0,
            },
            HoverTarget {
                id: "b".into(),
                name: "Bob".into(),
                x: 104.0,
                y_head: 200.0,
            },
        ];
        let placed = layout_nameplates(&labels, 8, 8.0);
        assert_eq!(placed.len(), 2);
        assert!(!placed[0].0.intersects(&placed[1].0));
        assert!(placed[1].0.y < placed[0].0.y);
        assert_eq!(placed[0].0.y, (200.0f32 - 12.0 - 18.0).round());
    }

    #[test]
    fn test_nameplate_retry_budget() {
        let labels: Vec<HoverTarget> = (0..3)
            .map(|i| HoverTarget {
                id: i.to_string(),
                name: "Same".into(),
                x: 100.0,
                y_head: 200.0,
            })
            .collect();
        // One retry: only the first label fits
        assert_eq!(layout_nameplates(&labels, 1, 8.0).len(), 1);
        assert_eq!(layout_nameplates(&labels, 8, 8.0).len(), 3);
        // Third label needs seven attempts
        assert_eq!(layout_nameplates(&labels, 6, 8.0).len(), 2);
    }

    #[test]
    fn test_background_ignores_gameplay() {
        let mut a = Fixture::new(RoomId::Lobby);
        let mut b = Fixture::new(RoomId::Lobby);
        for _ in 0..100 {
            a.clock.advance(0.016, true);
            b.clock.advance(0.016, false);
        }
        let mut reg = StallRegistry::new();
        let fa = compose(&a.scene(&[], None), &mut reg, 1);
        let fb = compose(&b.scene(&[], None), &mut reg, 2);
        let sky = |f: &RenderFrame| -> Vec<RenderCommand> {
            f.commands
                .iter()
                .filter(|c| {
                    matches!(
                        c,
                        RenderCommand::Cloud { .. }
                            | RenderCommand::Bird { .. }
                            | RenderCommand::SkyGradient { .. }
                    )
                })
                .cloned()
                .collect()
        };
        assert_eq!(sky(&fa), sky(&fb));
    }

    #[test]
    fn test_local_bob() {
        assert_eq!(local_bob(1.0, true, true), 0.0);
        assert!(local_bob(0.7, false, true).abs() <= 1.5);
        assert!(local_bob(0.7, false, false).abs() <= 0.6);
    }
}
