//! Dedicated render thread fed with frame tasks.
//!
//! The worker owns the [`Scene`] and executes [`FrameTask`]s in submission
//! order. Tasks are plain message objects; the scene is only reachable from
//! the worker thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use material_graphics::{MaterialError, RenderCommandEncoder};

use crate::scene::{Scene, UniformUpdate, Uniforms};

/// Work executed on the render thread.
pub trait FrameTask: Send {
    /// Run against the scene owned by the worker.
    fn execute(&mut self, scene: &mut Scene, stats: &mut WorkerStats) -> Result<(), MaterialError>;
}

/// Counters collected by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Frames encoded.
    pub frames: u64,
    /// Render commands recorded over all frames.
    pub commands: u64,
    /// Tasks that returned an error.
    pub failed_tasks: u64,
    /// Buffer flushes issued by the backend.
    pub flushes: u64,
}

/// Encode one frame at `time` seconds.
#[derive(Debug, Clone, Copy)]
pub struct DrawFrame {
    pub time: f32,
}

impl FrameTask for DrawFrame {
    fn execute(&mut self, scene: &mut Scene, stats: &mut WorkerStats) -> Result<(), MaterialError> {
        let uniforms = Uniforms::at_time(self.time, scene.aspect());
        let update = scene.config.uniform_update;
        let material = scene.mesh.material_mut();
        match update {
            UniformUpdate::WholeStruct => material.set_struct("ubo", &uniforms)?,
            UniformUpdate::PerMember => {
                material.set_struct_element("ubo.projection", &uniforms.projection)?;
                material.set_struct_element("ubo.model", &uniforms.model)?;
                material.set_struct_element("ubo.view", &uniforms.view)?;
            }
        }
        scene.mesh.update_material_properties()?;

        let mut encoder = RenderCommandEncoder::new().with_label("main pass");
        scene.mesh.encode_render_command(&mut encoder, 1, 0)?;
        encoder.end_encoding();

        stats.frames += 1;
        stats.commands += encoder.commands().len() as u64;
        log::trace!(
            "RenderWorker: frame {} at t={:.3}, {} commands",
            stats.frames,
            self.time,
            encoder.commands().len()
        );
        Ok(())
    }
}

enum WorkerMessage {
    Task(Box<dyn FrameTask>),
    Stop,
}

/// Handle to the render thread.
pub struct RenderWorker {
    sender: Sender<WorkerMessage>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl RenderWorker {
    /// Spawn the render thread, moving `scene` onto it.
    pub fn spawn(scene: Scene) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("render".to_string())
            .spawn(move || run(scene, receiver))?;
        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// Queue a task. Returns `false` if the worker is gone.
    pub fn submit(&self, task: impl FrameTask + 'static) -> bool {
        self.sender
            .send(WorkerMessage::Task(Box::new(task)))
            .is_ok()
    }

    /// Finish queued tasks, stop the thread and return its counters.
    ///
    /// Returns `None` if the render thread panicked.
    pub fn stop(mut self) -> Option<WorkerStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<WorkerStats> {
        let handle = self.handle.take()?;
        let _ = self.sender.send(WorkerMessage::Stop);
        handle.join().ok()
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(mut scene: Scene, receiver: Receiver<WorkerMessage>) -> WorkerStats {
    log::info!("Render thread begin");
    let mut stats = WorkerStats::default();
    while let Ok(WorkerMessage::Task(mut task)) = receiver.recv() {
        if let Err(err) = task.execute(&mut scene, &mut stats) {
            log::error!("Frame task failed: {err}");
            stats.failed_tasks += 1;
        }
    }
    stats.flushes = scene.backend.flush_count();
    log::info!("Render thread terminating...");
    stats
}
