use crate::core::asset_registry::{spawn_asset_loads, AssetLoadOutcome, AssetLoader, AssetRegistry};
use crate::core::config::Config;
use crate::core::overlay_controller::OverlayController;
use crate::core::scene_renderer::{DirectionalLight, SceneRenderer, SceneSnapshot};
use crate::core::viewport::{PerspectiveCamera, Viewport};
use crate::models::capture::VideoFrame;
use crate::models::jewelry::{JewelryCategory, Offset3D};
use crate::platform::capture::FrameSource;
use crate::platform::pose::MediaPipeBridge;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

// ==============================================================================
// Events
// ==============================================================================

/// User-driven input to a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Select(JewelryCategory),
    Resize { width: u32, height: u32 },
    Shutdown,
}

/// Sends events to a running session. The session stops once every handle
/// has been dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns `false` if the session has already ended.
    pub fn select(&self, category: JewelryCategory) -> bool {
        self.tx.send(SessionEvent::Select(category)).is_ok()
    }

    pub fn resize(&self, width: u32, height: u32) -> bool {
        self.tx.send(SessionEvent::Resize { width, height }).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(SessionEvent::Shutdown).is_ok()
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: i64,
    pub ended_at: i64,
    pub camera_available: bool,
    pub frames_processed: u64,
    pub placements_applied: u64,
    pub frames_rendered: u64,
    pub failed_assets: Vec<JewelryCategory>,
    pub final_selection: JewelryCategory,
    pub final_model: Option<JewelryCategory>,
    pub final_position: Option<Offset3D>,
}

// ==============================================================================
// Session
// ==============================================================================

/// One try-on session: owns the overlay state, the pose model and the
/// renderer, and runs every event on a single task.
pub struct TryOnSession<P: MediaPipeBridge, R: SceneRenderer> {
    id: Uuid,
    started_at: i64,
    controller: OverlayController,
    viewport: Viewport,
    light: DirectionalLight,
    pose: P,
    renderer: R,
    frames_processed: u64,
    placements_applied: u64,
    frames_rendered: u64,
    progress: watch::Sender<u64>, // Frames processed so far
}

impl<P: MediaPipeBridge, R: SceneRenderer> TryOnSession<P, R> {
    pub fn new(config: &Config, pose: P, renderer: R) -> Self {
        let mut camera = PerspectiveCamera::new(
            config.camera_fov,
            config.capture_width as f32 / config.capture_height.max(1) as f32,
            config.camera_near,
            config.camera_far,
        );
        camera.position = Offset3D::new(0.0, 0.0, config.camera_distance);
        let (progress, _) = watch::channel(0);

        Self {
            id: Uuid::new_v4(),
            started_at: chrono::Utc::now().timestamp_millis(),
            controller: OverlayController::new(
                config.initial_category,
                AssetRegistry::new(config.model_scale),
            ),
            viewport: Viewport::new(camera, config.capture_width, config.capture_height),
            light: DirectionalLight::default(),
            pose,
            renderer,
            frames_processed: 0,
            placements_applied: 0,
            frames_rendered: 0,
            progress,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn controller(&self) -> &OverlayController {
        &self.controller
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Follows the processed-frame count. Closes when the session ends.
    pub fn progress(&self) -> watch::Receiver<u64> {
        self.progress.subscribe()
    }

    pub fn on_asset_loaded(&mut self, outcome: AssetLoadOutcome) {
        self.controller.on_asset_loaded(outcome);
    }

    /// Apply a user event. Returns `false` for shutdown.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Select(category) => {
                self.controller.on_selection_change(category);
                true
            }
            SessionEvent::Resize { width, height } => {
                self.viewport.resize(width, height);
                info!("Viewport resized to {}x{}", width, height);
                true
            }
            SessionEvent::Shutdown => false,
        }
    }

    /// One frame cycle: landmarks, then placement, then render.
    pub fn process_frame(&mut self, frame: &VideoFrame) {
        self.frames_processed += 1;

        match self.pose.process_frame(frame) {
            Ok(pose_frame) => {
                if self.controller.on_pose_result(pose_frame.landmarks).is_some() {
                    self.placements_applied += 1;
                }
            }
            Err(e) => warn!("Pose inference failed: {}", e),
        }

        self.render();
        self.progress.send_replace(self.frames_processed);
    }

    fn render(&mut self) {
        let snapshot = SceneSnapshot {
            frame_index: self.frames_processed,
            camera: &self.viewport.camera,
            target: self.viewport.target,
            light: &self.light,
            model: self.controller.current_model().filter(|m| m.visible),
        };

        match self.renderer.render(&snapshot) {
            Ok(()) => self.frames_rendered += 1,
            Err(e) => warn!("Render failed: {}", e),
        }
    }

    /// Drive the session until shutdown, until every handle is dropped, or
    /// until the camera stream ends.
    ///
    /// Queued asset outcomes are applied before user events, and both before
    /// the next frame is requested. A camera that fails to start or errors
    /// mid-stream disables the frame cycle; everything else keeps running.
    pub async fn run<F: FrameSource>(
        mut self,
        mut camera: F,
        mut assets: mpsc::UnboundedReceiver<AssetLoadOutcome>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> SessionSummary {
        info!("Session {} started, pose model: {}", self.id, self.pose.get_model_info());
        if !self.pose.is_initialized() {
            warn!("Pose model is not initialized; frames will render without placement");
        }

        let camera_available = match camera.start().await {
            Ok(()) => {
                let (width, height) = camera.dimensions();
                info!("Camera started at {}x{}", width, height);
                true
            }
            Err(e) => {
                error!("Could not access camera: {}", e);
                false
            }
        };

        let mut camera_active = camera_available;
        let mut assets_open = true;

        loop {
            tokio::select! {
                biased;

                outcome = assets.recv(), if assets_open => match outcome {
                    Some(outcome) => self.controller.on_asset_loaded(outcome),
                    None => assets_open = false,
                },

                event = events.recv() => match event {
                    Some(event) => {
                        if !self.handle_event(event) {
                            break;
                        }
                    }
                    None => break,
                },

                frame = camera.next_frame(), if camera_active => match frame {
                    Ok(Some(frame)) => self.process_frame(&frame),
                    Ok(None) => {
                        info!("Camera stream ended");
                        break;
                    }
                    Err(e) => {
                        error!("Camera capture failed: {}", e);
                        camera_active = false;
                    }
                },
            }
        }

        let summary = self.summary(camera_available);
        info!(
            "Session {} ended after {} frames ({} placements)",
            summary.session_id, summary.frames_processed, summary.placements_applied
        );
        summary
    }

    fn summary(&self, camera_available: bool) -> SessionSummary {
        let current = self.controller.current_model();
        SessionSummary {
            session_id: self.id.to_string(),
            started_at: self.started_at,
            ended_at: chrono::Utc::now().timestamp_millis(),
            camera_available,
            frames_processed: self.frames_processed,
            placements_applied: self.placements_applied,
            frames_rendered: self.frames_rendered,
            failed_assets: self.controller.registry().failed_categories(),
            final_selection: self.controller.selected(),
            final_model: current.map(|m| m.category),
            final_position: current.map(|m| m.position),
        }
    }
}

/// A session running on its own task
pub struct RunningSession {
    pub handle: SessionHandle,
    pub progress: watch::Receiver<u64>,
    pub task: JoinHandle<SessionSummary>,
}

/// Start asset loading and run a session on its own task.
pub fn spawn_session<P, R, F>(
    config: &Config,
    pose: P,
    renderer: R,
    camera: F,
    loader: Arc<dyn AssetLoader>,
) -> RunningSession
where
    P: MediaPipeBridge + 'static,
    R: SceneRenderer + 'static,
    F: FrameSource + 'static,
{
    let session = TryOnSession::new(config, pose, renderer);
    let progress = session.progress();
    let (asset_tx, asset_rx) = mpsc::unbounded_channel();
    spawn_asset_loads(&config.asset_paths, loader, asset_tx);

    let (handle, events) = SessionHandle::channel();
    let task = tokio::spawn(session.run(camera, asset_rx, events));
    RunningSession {
        handle,
        progress,
        task,
    }
}

/// Move the selection to the next category after every `cycle_every`
/// processed frames, starting from `start`. Returns the last category
/// selected once the session has ended.
pub async fn rotate_selection(
    handle: &SessionHandle,
    progress: &mut watch::Receiver<u64>,
    start: JewelryCategory,
    cycle_every: u64,
) -> JewelryCategory {
    let cycle_every = cycle_every.max(1);
    let mut category = start;
    let mut next_switch = cycle_every;

    while progress.changed().await.is_ok() {
        let frames = *progress.borrow_and_update();
        if frames < next_switch {
            continue;
        }

        next_switch = (frames / cycle_every + 1) * cycle_every;
        if !handle.select(category.next()) {
            break;
        }
        category = category.next();
        info!("Selected {} after {} frames", category, frames);
    }

    category
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene_renderer::RenderResult;
    use crate::models::jewelry::{test_glb, AssetError, AssetResult, GlbScene};
    use crate::models::pose::{BodyLandmark, Landmark, LandmarkSet};
    use crate::platform::capture::SyntheticCamera;
    use crate::models::pose::PoseConfig;
    use crate::platform::pose::{DummyMediaPipe, ScriptedMediaPipe, ScriptedPose, SimulatedMediaPipe};
    use async_trait::async_trait;
    use image::RgbImage;
    use std::path::{Path, PathBuf};

    /// Records what was visible in each drawn frame
    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<Option<(JewelryCategory, Offset3D)>>,
        notify: Option<mpsc::UnboundedSender<()>>,
    }

    impl SceneRenderer for RecordingRenderer {
        fn render(&mut self, scene: &SceneSnapshot<'_>) -> RenderResult<()> {
            self.frames.push(scene.model.map(|m| (m.category, m.position)));
            if let Some(tx) = &self.notify {
                let _ = tx.send(());
            }
            Ok(())
        }
    }

    struct MemoryLoader;

    #[async_trait]
    impl AssetLoader for MemoryLoader {
        async fn load(&self, category: JewelryCategory, _path: &Path) -> AssetResult<GlbScene> {
            if category == JewelryCategory::Necklace {
                return Err(AssetError::InvalidGlb("missing glTF magic".to_string()));
            }
            GlbScene::parse(&test_glb(r#"{"asset":{"version":"2.0"}}"#, &[]))
        }
    }

    fn body() -> LandmarkSet {
        LandmarkSet::centered()
            .with(BodyLandmark::LeftShoulder, Landmark::new(0.4, 0.5))
            .with(BodyLandmark::RightShoulder, Landmark::new(0.6, 0.5))
            .with(BodyLandmark::LeftEar, Landmark::new(0.3, 0.4))
            .with(BodyLandmark::LeftWrist, Landmark::new(0.7, 0.6))
    }

    fn idle_pose() -> ScriptedMediaPipe {
        ScriptedMediaPipe::new(Vec::<ScriptedPose>::new())
    }

    fn frame() -> VideoFrame {
        VideoFrame {
            timestamp: 0,
            image: RgbImage::new(4, 4),
        }
    }

    fn loaded(category: JewelryCategory) -> AssetLoadOutcome {
        AssetLoadOutcome {
            category,
            path: PathBuf::from(format!("assets/{}.glb", category)),
            result: GlbScene::parse(&test_glb(r#"{"asset":{"version":"2.0"}}"#, &[])),
        }
    }

    #[test]
    fn test_new_session_matches_config() {
        let session = TryOnSession::new(&Config::default(), idle_pose(), RecordingRenderer::default());
        assert_eq!(session.viewport().camera.aspect, 640.0 / 480.0);
        assert_eq!(session.viewport().camera.position.z, 5.0);
        assert_eq!(session.viewport().target.width, 640);
        assert_eq!(session.controller().selected(), JewelryCategory::Necklace);
        assert!(session.controller().current_model().is_none());
    }

    #[test]
    fn test_frame_cycle_places_before_render() {
        let pose = ScriptedMediaPipe::new([
            ScriptedPose::Body(body()),
            ScriptedPose::NoBody,
            ScriptedPose::Fail("timeout".to_string()),
        ]);
        let mut session = TryOnSession::new(&Config::default(), pose, RecordingRenderer::default());

        // Nothing loaded yet: frame renders without jewelry.
        session.process_frame(&frame());
        session.on_asset_loaded(loaded(JewelryCategory::Necklace));
        session.handle_event(SessionEvent::Select(JewelryCategory::Ring));
        session.on_asset_loaded(loaded(JewelryCategory::Ring));
        session.process_frame(&frame());
        session.process_frame(&frame());

        let frames = &session.renderer().frames;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], None);

        // Registration does not reposition; the ring waits at the origin
        // for the next detected body.
        let (category, position) = frames[1].unwrap();
        assert_eq!(category, JewelryCategory::Ring);
        assert_eq!(position, Offset3D::ORIGIN);
        assert_eq!(frames[2], frames[1]);
        assert_eq!(session.placements_applied, 0);
    }

    #[test]
    fn test_selection_reuses_last_landmarks_for_render() {
        let pose = ScriptedMediaPipe::new([ScriptedPose::Body(body()), ScriptedPose::NoBody]);
        let mut session = TryOnSession::new(&Config::default(), pose, RecordingRenderer::default());
        for category in JewelryCategory::ALL {
            session.on_asset_loaded(loaded(category));
        }

        session.process_frame(&frame());
        session.handle_event(SessionEvent::Select(JewelryCategory::Earrings));
        session.process_frame(&frame());

        let frames = &session.renderer().frames;
        let (category, position) = frames[0].unwrap();
        assert_eq!(category, JewelryCategory::Necklace);
        assert!(position.x.abs() < 1e-5 && position.y.abs() < 1e-5);

        let (category, position) = frames[1].unwrap();
        assert_eq!(category, JewelryCategory::Earrings);
        assert!((position.x + 2.0).abs() < 1e-5 && (position.y - 1.0).abs() < 1e-5);
        assert_eq!(session.placements_applied, 1);
    }

    #[test]
    fn test_resize_event_updates_viewport() {
        let mut session = TryOnSession::new(&Config::default(), idle_pose(), RecordingRenderer::default());
        assert!(session.handle_event(SessionEvent::Resize { width: 1280, height: 720 }));
        assert_eq!(session.viewport().camera.aspect, 1280.0 / 720.0);
        assert_eq!((session.viewport().target.width, session.viewport().target.height), (1280, 720));
        assert!(!session.handle_event(SessionEvent::Shutdown));
    }

    #[tokio::test]
    async fn test_run_without_camera_still_handles_events() {
        let session = TryOnSession::new(&Config::default(), idle_pose(), RecordingRenderer::default());
        let camera = SyntheticCamera::new(64, 48, 30).denying_access();

        let (asset_tx, asset_rx) = mpsc::unbounded_channel();
        asset_tx
            .send(AssetLoadOutcome {
                category: JewelryCategory::Necklace,
                path: PathBuf::from("assets/necklace.glb"),
                result: Err(AssetError::InvalidGlb("missing glTF magic".to_string())),
            })
            .unwrap();
        asset_tx.send(loaded(JewelryCategory::Ring)).unwrap();

        let (handle, events) = SessionHandle::channel();
        handle.select(JewelryCategory::Necklace);
        handle.select(JewelryCategory::Ring);
        handle.resize(1280, 720);
        handle.shutdown();

        let summary = session.run(camera, asset_rx, events).await;
        assert!(!summary.camera_available);
        assert_eq!(summary.frames_processed, 0);
        assert_eq!(summary.failed_assets, vec![JewelryCategory::Necklace]);
        assert_eq!(summary.final_selection, JewelryCategory::Ring);
        assert_eq!(summary.final_model, Some(JewelryCategory::Ring));
        drop(asset_tx);
    }

    #[tokio::test]
    async fn test_spawned_session_processes_frames_in_order() {
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
        let renderer = RecordingRenderer {
            frames: Vec::new(),
            notify: Some(notify_tx),
        };
        let pose = ScriptedMediaPipe::new(vec![ScriptedPose::Body(body()); 3]);
        let camera = SyntheticCamera::new(64, 48, 60).with_frame_limit(3);

        let running = spawn_session(&Config::default(), pose, renderer, camera, Arc::new(MemoryLoader));

        for _ in 0..3 {
            notify_rx.recv().await.unwrap();
        }

        // The finite stream ends the session without a shutdown event.
        let summary = running.task.await.unwrap();
        assert!(summary.camera_available);
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.frames_rendered, 3);
        assert_eq!(summary.final_selection, JewelryCategory::Necklace);
        assert!(!running.handle.shutdown());
    }

    #[tokio::test]
    async fn test_finite_camera_processes_every_frame() {
        let pose = SimulatedMediaPipe::new(&PoseConfig::default(), 60).unwrap();
        let camera = SyntheticCamera::new(64, 48, 60).with_frame_limit(60);
        let running = spawn_session(
            &Config::default(),
            pose,
            RecordingRenderer::default(),
            camera,
            Arc::new(MemoryLoader),
        );

        let summary = running.task.await.unwrap();
        assert_eq!(summary.frames_processed, 60);
        assert_eq!(summary.frames_rendered, 60);
        assert_eq!(*running.progress.borrow(), 60);
    }

    #[tokio::test]
    async fn test_uninitialized_pose_model_renders_without_placement() {
        let session = TryOnSession::new(&Config::default(), DummyMediaPipe, RecordingRenderer::default());
        let camera = SyntheticCamera::new(64, 48, 60).with_frame_limit(2);
        let (_asset_tx, asset_rx) = mpsc::unbounded_channel();
        let (_handle, events) = SessionHandle::channel();

        let summary = session.run(camera, asset_rx, events).await;
        assert_eq!(summary.frames_rendered, 2);
        assert_eq!(summary.placements_applied, 0);
    }

    #[tokio::test]
    async fn test_rotation_follows_frame_count() {
        let pose = ScriptedMediaPipe::new(vec![ScriptedPose::Body(body()); 10]);
        let camera = SyntheticCamera::new(64, 48, 30).with_frame_limit(10);
        let RunningSession {
            handle,
            mut progress,
            task,
        } = spawn_session(
            &Config::default(),
            pose,
            RecordingRenderer::default(),
            camera,
            Arc::new(MemoryLoader),
        );

        // Switches after frames 4 and 8.
        let last = rotate_selection(&handle, &mut progress, JewelryCategory::Necklace, 4).await;
        assert_eq!(last, JewelryCategory::Ring);

        let summary = task.await.unwrap();
        assert_eq!(summary.frames_processed, 10);
        assert_eq!(summary.final_selection, JewelryCategory::Ring);
        assert_eq!(summary.final_model, Some(JewelryCategory::Ring));
    }

    #[tokio::test]
    async fn test_dropping_every_handle_ends_session() {
        let session = TryOnSession::new(&Config::default(), idle_pose(), RecordingRenderer::default());
        let camera = SyntheticCamera::new(64, 48, 30).with_frame_limit(0);
        let (_asset_tx, asset_rx) = mpsc::unbounded_channel();
        let (handle, events) = SessionHandle::channel();
        drop(handle);

        let summary = session.run(camera, asset_rx, events).await;
        assert_eq!(summary.frames_processed, 0);
    }
}
