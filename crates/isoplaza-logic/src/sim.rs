//! Room simulation - owns every piece of per-room state.
//!
//! A host feeds viewport size, peer snapshots, chat and input events in, and
//! calls [`RoomSimulation::tick`] once per frame to get a [`RenderFrame`].
//! Outbound traffic (position reports, stall visits, sit changes, bubbles)
//! queues up until the host calls [`RoomSimulation::drain_events`].
//!
//! Everything runs on the caller's thread. Input events are applied in
//! order at the start of a tick, then movement, timers, smoothing and
//! rendering run exactly once.

use crate::chat::{BubbleBoard, ChatCommand, ChatMessage};
use crate::clock::AnimationClock;
use crate::config::{validate_config, EngineConfig};
use crate::facing::Facing;
use crate::grid::{Cell, Grid};
use crate::input::{HeldKeys, InputEvent};
use crate::interaction::{
    approach_cell, arrival_delay_ms, pick_hover, ClickOutcome, HoverTarget, PendingArrival,
    StallRegistry, VisitPrompt,
};
use crate::iso::{IsoProjector, Viewport};
use crate::layout::{RoomId, RoomLayout, StallKind};
use crate::motion::{Avatar, MotionController, MotionEvent, MotionState, NavOutcome, SitOutcome};
use crate::peers::{Peer, PeerReconciler};
use crate::render::{self, LocalView, RenderFrame, Scene};

pub const SMILE_TEXT: &str = ":)";
pub const NO_SEAT_TEXT: &str = "No free seat!";

/// Traffic for the transport and routing collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    PositionReport { x: f32, y: f32, facing: Facing },
    StallVisit { stall_id: String, kind: StallKind },
    SitChanged(bool),
    Bubble(String),
}

/// One frame's worth of host input.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame, before clamping.
    pub dt: f32,
    /// Wall clock in milliseconds.
    pub now_ms: u64,
    pub events: Vec<InputEvent>,
}

impl FrameInput {
    pub fn new(dt: f32, now_ms: u64) -> Self {
        Self {
            dt,
            now_ms,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: InputEvent) -> Self {
        self.events.push(event);
        self
    }
}

pub struct RoomSimulation {
    config: EngineConfig,
    layout: RoomLayout,
    grid: Grid,
    viewport: Viewport,
    projector: IsoProjector,
    motion: MotionController,
    clock: AnimationClock,
    peers: Vec<Peer>,
    reconciler: PeerReconciler,
    bubbles: BubbleBoard,
    registry: StallRegistry,
    held: HeldKeys,
    text_focus: bool,
    wave: bool,
    laugh: bool,
    /// Slash-command emotes run until these wall-clock deadlines.
    wave_until: u64,
    laugh_until: u64,
    hovered: Option<String>,
    hover_targets: Vec<HoverTarget>,
    pending_arrival: Option<PendingArrival>,
    prompt: Option<VisitPrompt>,
    outbound: Vec<OutboundEvent>,
    last_report_ms: Option<u64>,
    self_name: String,
    frame: u64,
    now_ms: u64,
}

impl RoomSimulation {
    /// Simulation in a built-in room.
    pub fn new(config: EngineConfig, room: RoomId, self_name: impl Into<String>) -> Self {
        Self::with_layout(config, RoomLayout::preset(room), self_name)
    }

    /// Simulation in an arbitrary (already validated) layout.
    ///
    /// An invalid config is replaced by [`EngineConfig::default`].
    pub fn with_layout(
        config: EngineConfig,
        layout: RoomLayout,
        self_name: impl Into<String>,
    ) -> Self {
        let errors = validate_config(&config);
        let config = if errors.is_empty() {
            config
        } else {
            log::warn!(
                "Engine config rejected ({} error(s)), using defaults: {:?}",
                errors.len(),
                errors
            );
            EngineConfig::default()
        };
        let grid = Grid::from_layout(&layout);
        let viewport = Viewport::default();
        let projector = project_for(&config, viewport, &grid);
        Self {
            motion: MotionController::new(layout.spawn, layout.spawn_facing, config.travel_speed),
            clock: AnimationClock::new(&config),
            reconciler: PeerReconciler::new(config.peer_smoothing_rate),
            peers: Vec::new(),
            bubbles: BubbleBoard::new(),
            registry: StallRegistry::new(),
            held: HeldKeys::default(),
            text_focus: false,
            wave: false,
            laugh: false,
            wave_until: 0,
            laugh_until: 0,
            hovered: None,
            hover_targets: Vec::new(),
            pending_arrival: None,
            prompt: None,
            outbound: Vec::new(),
            last_report_ms: None,
            self_name: self_name.into(),
            frame: 0,
            now_ms: 0,
            config,
            layout,
            grid,
            viewport,
            projector,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn room(&self) -> RoomId {
        self.layout.id
    }

    pub fn layout(&self) -> &RoomLayout {
        &self.layout
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projector(&self) -> &IsoProjector {
        &self.projector
    }

    pub fn avatar(&self) -> &Avatar {
        self.motion.avatar()
    }

    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    pub fn state(&self) -> MotionState {
        self.motion.state()
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn reconciler(&self) -> &PeerReconciler {
        &self.reconciler
    }

    pub fn bubbles(&self) -> &BubbleBoard {
        &self.bubbles
    }

    pub fn registry(&self) -> &StallRegistry {
        &self.registry
    }

    pub fn prompt(&self) -> Option<&VisitPrompt> {
        self.prompt.as_ref()
    }

    pub fn pending_arrival(&self) -> Option<&PendingArrival> {
        self.pending_arrival.as_ref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Switch rooms. Grid, seats and stalls are replaced together and any
    /// path, seat, pending arrival and prompt are discarded. The avatar
    /// keeps its cell if it is walkable in the new room, else it spawns.
    pub fn set_room(&mut self, room: RoomId) {
        self.set_layout(RoomLayout::preset(room));
    }

    pub fn set_layout(&mut self, layout: RoomLayout) {
        let grid = Grid::from_layout(&layout);
        let was_sitting = self.motion.is_sitting();
        let here = self.motion.avatar().cell();
        let facing = self.motion.avatar().facing;

        if grid.is_walkable_cell(here) {
            self.motion.reset(here, facing);
        } else {
            self.motion.reset(layout.spawn, layout.spawn_facing);
        }
        if was_sitting {
            self.outbound.push(OutboundEvent::SitChanged(false));
        }

        log::info!(
            "room switch {} -> {} ({} walkable cells)",
            self.layout.id.name(),
            layout.id.name(),
            grid.walkable_count()
        );
        self.projector = project_for(&self.config, self.viewport, &grid);
        self.grid = grid;
        self.layout = layout;
        self.pending_arrival = None;
        self.prompt = None;
        self.hovered = None;
        self.hover_targets.clear();
        self.registry.invalidate();
    }

    /// Resize. The projection is recomputed and stale hit boxes dropped.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width, height);
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.projector = project_for(&self.config, viewport, &self.grid);
        self.registry.invalidate();
        self.hover_targets.clear();
    }

    /// Replace the authoritative peer snapshot.
    pub fn set_peers(&mut self, peers: Vec<Peer>) {
        self.peers = peers;
    }

    /// Merge the recent chat feed into speech bubbles.
    pub fn ingest_chat(&mut self, messages: &[ChatMessage], now_ms: u64) {
        self.bubbles
            .ingest(messages, self.config.chat_window, self.config.chat_bubble_ms, now_ms);
    }

    pub fn set_text_focus(&mut self, focused: bool) {
        self.text_focus = focused;
        if focused {
            self.held.clear();
        }
    }

    pub fn set_emotes(&mut self, wave: bool, laugh: bool) {
        self.wave = wave;
        self.laugh = laugh;
    }

    /// Handle a line submitted from the chat box. Slash commands act
    /// locally; anything else is handed back for the chat transport.
    pub fn submit_chat(&mut self, line: &str) -> Option<String> {
        match ChatCommand::parse(line)? {
            ChatCommand::Sit => {
                self.toggle_sit();
                None
            }
            ChatCommand::Wave => {
                self.wave_until = self.now_ms + self.config.notice_ms;
                None
            }
            ChatCommand::Laugh => {
                self.laugh_until = self.now_ms + self.config.notice_ms;
                None
            }
            ChatCommand::Say(text) => Some(text),
        }
    }

    /// Whether the local avatar is waving / laughing right now.
    pub fn emotes(&self) -> (bool, bool) {
        (
            self.wave || self.now_ms < self.wave_until,
            self.laugh || self.now_ms < self.laugh_until,
        )
    }

    /// Apply one input event at the current wall clock.
    pub fn handle_input(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerClick { x, y } => {
                self.click(x, y);
            }
            InputEvent::PointerDoubleClick { .. } => self.smile(),
            InputEvent::PointerMove { x, y } => {
                self.hovered = pick_hover(&self.hover_targets, x, y, self.config.hover_radius)
                    .map(|t| t.id.clone());
            }
            InputEvent::PointerLeave => self.hovered = None,
            InputEvent::KeyDown(key) => {
                if self.text_focus {
                    return;
                }
                self.held.press(key);
                self.try_held_step();
            }
            InputEvent::KeyUp(key) => self.held.release(key),
            InputEvent::TextFocus(focused) => self.set_text_focus(focused),
            InputEvent::ToggleSit => {
                self.toggle_sit();
            }
            InputEvent::SetEmotes { wave, laugh } => self.set_emotes(wave, laugh),
            InputEvent::ConfirmVisit => self.confirm_visit(),
            InputEvent::DismissVisit => self.prompt = None,
        }
    }

    /// Pointer click at viewport pixel `(px, py)`.
    ///
    /// Stalls are hit-tested first. A hit walks to the stall (or its first
    /// walkable neighbour) and schedules the visit prompt for the estimated
    /// arrival; with no route the prompt opens immediately. A miss becomes a
    /// floor navigation to the clamped cell under the pointer.
    pub fn click(&mut self, px: f32, py: f32) -> ClickOutcome {
        if !self.registry.is_current(self.frame) {
            render::register_stalls(
                &self.layout,
                &self.projector,
                &self.config,
                &mut self.registry,
                self.frame,
            );
        }

        let hit = self
            .registry
            .hit_test(px, py, self.frame)
            .and_then(|b| self.layout.stall(&b.stall_id))
            .cloned();

        if let Some(stall) = hit {
            let prompt = VisitPrompt::for_stall(&stall);
            self.pending_arrival = None;

            let outcome = match approach_cell(&self.grid, stall.cell()) {
                Some(target) => self.navigate(target),
                None => NavOutcome::Unreachable,
            };
            if let NavOutcome::Started { nodes } = outcome {
                let due_at_ms = self.now_ms + arrival_delay_ms(nodes, self.config.travel_speed);
                log::debug!("walking to stall {} ({} nodes)", stall.id, nodes);
                self.pending_arrival = Some(PendingArrival { due_at_ms, prompt });
                return ClickOutcome::StallApproach {
                    stall_id: stall.id,
                    due_at_ms,
                };
            }
            self.prompt = Some(prompt);
            return ClickOutcome::StallPrompt { stall_id: stall.id };
        }

        let picked = self.projector.pick_cell(px, py);
        let cell = self.grid.clamp_interior(picked.x, picked.y);
        let outcome = self.navigate(cell);
        ClickOutcome::Floor { cell, outcome }
    }

    /// Toggle sitting: stand, cancel a seek, or walk to the nearest free seat.
    pub fn toggle_sit(&mut self) -> SitOutcome {
        let occupied: Vec<Cell> = self.peers.iter().map(Peer::cell).collect();
        let outcome = self
            .motion
            .seek_seat(&self.grid, &self.layout.seats, &occupied);
        match outcome {
            SitOutcome::StoodUp => self.outbound.push(OutboundEvent::SitChanged(false)),
            SitOutcome::SatDown(_) => {
                self.pending_arrival = None;
                self.outbound.push(OutboundEvent::SitChanged(true));
            }
            SitOutcome::Seeking(_) => self.pending_arrival = None,
            SitOutcome::NoFreeSeat => {
                self.bubbles
                    .post(&self.self_name, NO_SEAT_TEXT, self.now_ms, self.config.notice_ms);
            }
            SitOutcome::Cancelled | SitOutcome::Unreachable(_) => {}
        }
        outcome
    }

    /// Confirm the open visit prompt, emitting a stall visit.
    pub fn confirm_visit(&mut self) {
        if let Some(prompt) = self.prompt.take() {
            log::info!("visit confirmed: {} ({})", prompt.stall_id, prompt.kind.as_str());
            self.outbound.push(OutboundEvent::StallVisit {
                stall_id: prompt.stall_id,
                kind: prompt.kind,
            });
        }
    }

    /// Advance one frame and render it.
    pub fn tick(&mut self, input: FrameInput) -> RenderFrame {
        self.now_ms = input.now_ms;
        let dt = input.dt.max(0.0).min(self.config.max_frame_delta);

        // Input, in arrival order
        for event in &input.events {
            self.handle_input(event);
        }

        // Movement: continue the path, or take a held-key step when idle
        self.try_held_step();
        match self.motion.advance(dt) {
            Some(MotionEvent::SatDown(_)) => self.outbound.push(OutboundEvent::SitChanged(true)),
            Some(MotionEvent::Arrived(_)) | None => {}
        }

        // Timers
        if self.pending_arrival.as_ref().is_some_and(|p| p.is_due(self.now_ms)) {
            if let Some(arrival) = self.pending_arrival.take() {
                log::debug!("arrived at stall {}", arrival.prompt.stall_id);
                self.prompt = Some(arrival.prompt);
            }
        }
        self.bubbles.prune(self.now_ms);

        let active =
            !self.motion.is_sitting() && (self.motion.is_moving() || !self.held.is_empty());
        self.clock.advance(dt, self.motion.is_moving());

        // Throttled position report
        let due = self.last_report_ms.map_or(true, |last| {
            self.now_ms.saturating_sub(last) > self.config.report_interval_ms
        });
        if due {
            let a = *self.motion.avatar();
            self.outbound.push(OutboundEvent::PositionReport {
                x: a.x,
                y: a.y,
                facing: a.facing,
            });
            self.last_report_ms = Some(self.now_ms);
        }

        // Peers, then draw
        self.reconciler.reconcile(&self.peers, dt);
        self.frame += 1;
        let (wave, laugh) = self.emotes();
        let scene = Scene {
            viewport: self.viewport,
            projector: &self.projector,
            grid: &self.grid,
            layout: &self.layout,
            config: &self.config,
            clock: &self.clock,
            peers: &self.peers,
            smoothed: &self.reconciler,
            bubbles: &self.bubbles,
            now_ms: self.now_ms,
            local: LocalView {
                avatar: self.motion.avatar(),
                name: &self.self_name,
                sitting: self.motion.is_sitting(),
                active,
                wave,
                laugh,
            },
            hovered: self.hovered.as_deref(),
        };
        let frame = render::compose(&scene, &mut self.registry, self.frame);
        self.hover_targets.clone_from(&frame.hover_targets);
        frame
    }

    /// Take every queued outbound event.
    pub fn drain_events(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.outbound)
    }

    fn smile(&mut self) {
        self.bubbles
            .post(&self.self_name, SMILE_TEXT, self.now_ms, self.config.notice_ms);
        self.outbound.push(OutboundEvent::Bubble(SMILE_TEXT.to_string()));
    }

    /// Navigation request on behalf of a click. Cancels the pending
    /// arrival when the avatar ends up with a new path or stays put.
    fn navigate(&mut self, goal: Cell) -> NavOutcome {
        let was_sitting = self.motion.is_sitting();
        let outcome = self.motion.navigate_to(&self.grid, goal);
        if matches!(outcome, NavOutcome::Started { .. } | NavOutcome::AlreadyThere) {
            self.pending_arrival = None;
        }
        if was_sitting && !self.motion.is_sitting() {
            self.outbound.push(OutboundEvent::SitChanged(false));
        }
        outcome
    }

    fn try_held_step(&mut self) {
        if self.text_focus || self.motion.state() != MotionState::Idle {
            return;
        }
        if let Some((dx, dy)) = self.held.direction() {
            if self.motion.step_held(&self.grid, dx, dy).started() {
                self.pending_arrival = None;
            }
        }
    }
}

fn project_for(config: &EngineConfig, viewport: Viewport, grid: &Grid) -> IsoProjector {
    IsoProjector::centered(
        viewport,
        grid.cols(),
        grid.rows(),
        config.tile_width,
        config.tile_height,
        config.origin_nudge,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MoveKey;

    const FRAME: f32 = 1.0 / 60.0;

    fn sim() -> RoomSimulation {
        let mut sim = RoomSimulation::new(EngineConfig::default(), RoomId::Lobby, "me");
        sim.set_viewport(1280.0, 720.0);
        sim
    }

    /// Run frames of `FRAME` seconds starting at `t` ms; returns the end time.
    fn run(sim: &mut RoomSimulation, mut t: u64, frames: usize) -> u64 {
        for _ in 0..frames {
            t += 16;
            sim.tick(FrameInput::new(FRAME, t));
        }
        t
    }

    fn click_cell(sim: &RoomSimulation, cell: Cell) -> (f32, f32) {
        let (px, py) = sim.projector().project_cell(cell);
        (px, py + sim.projector().half_h)
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let config = EngineConfig {
            travel_speed: 0.0,
            ..EngineConfig::default()
        };
        let mut sim = RoomSimulation::new(config, RoomId::Lobby, "me");
        sim.set_viewport(1280.0, 720.0);
        assert_eq!(sim.config(), &EngineConfig::default());

        let (px, py) = click_cell(&sim, Cell::new(3, 6));
        sim.click(px, py);
        run(&mut sim, 0, 600);
        assert_eq!(sim.avatar().cell(), Cell::new(3, 6));
        assert_eq!(sim.motion().state(), MotionState::Idle);
    }

    #[test]
    fn test_spawn_state() {
        let sim = sim();
        assert_eq!(sim.avatar().cell(), Cell::new(6, 6));
        assert_eq!(sim.state(), MotionState::Idle);
        assert_eq!(sim.room(), RoomId::Lobby);
    }

    #[test]
    fn test_floor_click_walks() {
        let mut sim = sim();
        let (px, py) = click_cell(&sim, Cell::new(6, 4));
        let outcome = sim.click(px, py);
        assert_eq!(
            outcome,
            ClickOutcome::Floor {
                cell: Cell::new(6, 4),
                outcome: NavOutcome::Started { nodes: 3 }
            }
        );
        run(&mut sim, 0, 120);
        assert_eq!(sim.avatar().cell(), Cell::new(6, 4));
        assert_eq!(sim.state(), MotionState::Idle);
    }

    #[test]
    fn test_click_outside_floor_is_clamped() {
        let mut sim = sim();
        let outcome = sim.click(-500.0, -500.0);
        match outcome {
            ClickOutcome::Floor { cell, .. } => {
                assert!(cell.x >= 1 && cell.y >= 1);
                assert!(cell.x <= 18 && cell.y <= 14);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stall_click_schedules_prompt_once() {
        let mut sim = sim();
        run(&mut sim, 0, 1);
        let stall = sim.layout().stall("stake-stall").unwrap().clone();
        let (px, py) = sim.projector().project_cell(stall.cell());
        let outcome = sim.click(px, py - 10.0);
        let due = match outcome {
            ClickOutcome::StallApproach { stall_id, due_at_ms } => {
                assert_eq!(stall_id, "stake-stall");
                due_at_ms
            }
            other => panic!("unexpected {:?}", other),
        };
        assert!(sim.prompt().is_none());

        let mut t = 16;
        while t < due + 500 {
            t += 16;
            sim.tick(FrameInput::new(FRAME, t));
        }
        assert_eq!(sim.prompt().map(|p| p.stall_id.as_str()), Some("stake-stall"));
        assert!(sim.pending_arrival().is_none());

        sim.handle_input(&InputEvent::ConfirmVisit);
        let visits: Vec<OutboundEvent> = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OutboundEvent::StallVisit { .. }))
            .collect();
        assert_eq!(visits.len(), 1);
        assert!(sim.prompt().is_none());
    }

    #[test]
    fn test_preempted_arrival_is_cancelled() {
        let mut sim = sim();
        run(&mut sim, 0, 1);
        let stall = sim.layout().stall("yield-stall").unwrap().clone();
        let (px, py) = sim.projector().project_cell(stall.cell());
        assert!(matches!(sim.click(px, py - 10.0), ClickOutcome::StallApproach { .. }));
        let (fx, fy) = click_cell(&sim, Cell::new(6, 8));
        sim.click(fx, fy);
        assert!(sim.pending_arrival().is_none());
        run(&mut sim, 16, 600);
        assert!(sim.prompt().is_none());
    }

    #[test]
    fn test_dismiss_prompt() {
        let mut sim = sim();
        run(&mut sim, 0, 1);
        // The mall stall is walled in on every side
        let stall = sim.layout().stall("mall-stall").unwrap().clone();
        let (px, py) = sim.projector().project_cell(stall.cell());
        assert_eq!(
            sim.click(px, py - 10.0),
            ClickOutcome::StallPrompt {
                stall_id: "mall-stall".into()
            }
        );
        assert_eq!(sim.state(), MotionState::Idle);
        assert!(sim.prompt().is_some());
        sim.handle_input(&InputEvent::DismissVisit);
        assert!(sim.prompt().is_none());
        assert!(sim.drain_events().iter().all(|e| !matches!(e, OutboundEvent::StallVisit { .. })));
    }

    #[test]
    fn test_position_reports_throttled() {
        let mut sim = sim();
        let mut t = 0;
        for _ in 0..60 {
            t += 10;
            sim.tick(FrameInput::new(0.01, t));
        }
        let reports = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OutboundEvent::PositionReport { .. }))
            .count();
        // 600 ms at a strict 100 ms interval
        assert!((5..=6).contains(&reports), "{}", reports);
    }

    #[test]
    fn test_dt_clamped() {
        let mut sim = sim();
        let (px, py) = click_cell(&sim, Cell::new(3, 6));
        sim.click(px, py);
        // A five second stall only advances one clamped step
        sim.tick(FrameInput::new(5.0, 5_000));
        let expected = 6.0 - 3.4 * 0.05;
        assert!((sim.avatar().x - expected).abs() < 1e-4, "{}", sim.avatar().x);
        assert_eq!(sim.avatar().facing, Facing::West);
    }

    #[test]
    fn test_held_keys_move_and_focus_blocks() {
        let mut sim = sim();
        sim.tick(FrameInput::new(FRAME, 16).with_event(InputEvent::KeyDown(MoveKey::Down)));
        assert!(sim.motion().is_moving());
        run(&mut sim, 16, 30);
        sim.handle_input(&InputEvent::KeyUp(MoveKey::Down));
        run(&mut sim, 600, 30);
        let moved = sim.avatar().cell();
        assert!(moved.y > 6);

        sim.handle_input(&InputEvent::TextFocus(true));
        sim.handle_input(&InputEvent::KeyDown(MoveKey::Up));
        run(&mut sim, 2_000, 30);
        assert_eq!(sim.avatar().cell(), moved);
    }

    #[test]
    fn test_sit_toggle_emits_changes() {
        let mut sim = sim();
        assert!(matches!(sim.toggle_sit(), SitOutcome::Seeking(_)));
        run(&mut sim, 0, 600);
        assert!(sim.motion().is_sitting());
        assert_eq!(sim.toggle_sit(), SitOutcome::StoodUp);
        let sits: Vec<OutboundEvent> = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OutboundEvent::SitChanged(_)))
            .collect();
        assert_eq!(sits, vec![OutboundEvent::SitChanged(true), OutboundEvent::SitChanged(false)]);
    }

    #[test]
    fn test_no_free_seat_notice() {
        let mut sim = sim();
        let seats = sim.layout().seats.clone();
        let peers = seats
            .iter()
            .enumerate()
            .map(|(i, s)| Peer::new(format!("p{}", i), "", s.x as f32, s.y as f32))
            .collect();
        sim.set_peers(peers);
        assert_eq!(sim.toggle_sit(), SitOutcome::NoFreeSeat);
        assert_eq!(sim.avatar().cell(), Cell::new(6, 6));
        assert_eq!(sim.bubbles().active("me", 0).map(|b| b.text.as_str()), Some(NO_SEAT_TEXT));
    }

    #[test]
    fn test_double_click_smiles() {
        let mut sim = sim();
        let input = FrameInput::new(FRAME, 1_000)
            .with_event(InputEvent::PointerDoubleClick { x: 0.0, y: 0.0 });
        let frame = sim.tick(input);
        assert_eq!(frame.bubbles().collect::<Vec<_>>(), [SMILE_TEXT]);
        assert!(sim.drain_events().contains(&OutboundEvent::Bubble(SMILE_TEXT.into())));
        let later = sim.tick(FrameInput::new(FRAME, 3_001));
        assert_eq!(later.bubbles().count(), 0);
    }

    #[test]
    fn test_room_switch_resets_motion() {
        let mut sim = sim();
        let (px, py) = click_cell(&sim, Cell::new(3, 6));
        sim.click(px, py);
        run(&mut sim, 0, 5);
        assert!(sim.motion().is_moving());
        sim.set_room(RoomId::Cafe);
        assert_eq!(sim.room(), RoomId::Cafe);
        assert_eq!(sim.state(), MotionState::Idle);
        assert!(sim.motion().path().is_empty());
        assert!(sim.grid().is_walkable_cell(sim.avatar().cell()));
        assert!(sim.registry().frame().is_none());
    }

    #[test]
    fn test_room_switch_to_blocked_cell_respawns() {
        let mut sim = sim();
        // (3,8) is open floor in the lobby and a table in the cafe
        let (px, py) = click_cell(&sim, Cell::new(3, 8));
        sim.click(px, py);
        run(&mut sim, 0, 600);
        assert_eq!(sim.avatar().cell(), Cell::new(3, 8));
        sim.set_room(RoomId::Cafe);
        assert_eq!(sim.avatar().cell(), sim.layout().spawn);
    }

    #[test]
    fn test_room_switch_keeps_walkable_cell() {
        let mut sim = sim();
        let (px, py) = click_cell(&sim, Cell::new(3, 6));
        sim.click(px, py);
        run(&mut sim, 0, 600);
        sim.set_room(RoomId::Cafe);
        assert_eq!(sim.avatar().cell(), Cell::new(3, 6));
    }

    #[test]
    fn test_room_switch_while_sitting_stands() {
        let mut sim = sim();
        sim.toggle_sit();
        run(&mut sim, 0, 600);
        assert!(sim.motion().is_sitting());
        sim.drain_events();
        sim.set_room(RoomId::Rooftop);
        assert!(!sim.motion().is_sitting());
        assert!(sim.drain_events().contains(&OutboundEvent::SitChanged(false)));
    }

    #[test]
    fn test_viewport_change_invalidates_registry() {
        let mut sim = sim();
        run(&mut sim, 0, 1);
        assert!(sim.registry().is_current(sim.frame()));
        sim.set_viewport(800.0, 600.0);
        assert!(sim.registry().frame().is_none());
        // A click right after the resize uses boxes for the new projection
        let stall = sim.layout().stall("stake-stall").unwrap().clone();
        let (px, py) = sim.projector().project_cell(stall.cell());
        assert!(matches!(sim.click(px, py - 10.0), ClickOutcome::StallApproach { .. }));
    }

    #[test]
    fn test_hover_picks_and_clears() {
        let mut sim = sim();
        let frame = run_frame(&mut sim);
        let me = frame.hover_targets.last().unwrap().clone();
        sim.handle_input(&InputEvent::PointerMove {
            x: me.x,
            y: me.y_head - 8.0,
        });
        assert_eq!(sim.hovered(), Some(render::LOCAL_AVATAR_ID));
        sim.handle_input(&InputEvent::PointerLeave);
        assert_eq!(sim.hovered(), None);
    }

    #[test]
    fn test_chat_commands() {
        let mut sim = sim();
        sim.tick(FrameInput::new(FRAME, 1_000));
        assert_eq!(sim.submit_chat("  hello there "), Some("hello there".into()));
        assert_eq!(sim.submit_chat("   "), None);

        assert_eq!(sim.submit_chat("/WAVE"), None);
        assert_eq!(sim.emotes(), (true, false));
        let frame = sim.tick(FrameInput::new(FRAME, 1_500));
        assert!(frame.avatars().last().unwrap().wave);
        sim.tick(FrameInput::new(FRAME, 3_000));
        assert_eq!(sim.emotes(), (false, false));

        assert_eq!(sim.submit_chat("/sit"), None);
        assert!(sim.motion().is_moving());
    }

    fn run_frame(sim: &mut RoomSimulation) -> RenderFrame {
        sim.tick(FrameInput::new(FRAME, 16))
    }
}
