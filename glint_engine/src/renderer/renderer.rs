/// Renderer - one device session
///
/// The renderer is the explicit context object every engine call goes
/// through. It owns the device (once the host attaches one), the bound-state
/// cache, the frame scheduler, the resource registry, the program cache and
/// the command set.
///
/// Every public mutation may leave requests in the session's `WorkRequests`;
/// they are flushed into the scheduler before the call returns. The host
/// drives the scheduler by calling `tick` once per display refresh while
/// `is_frame_requested` is true.
///
/// Resources and commands can be registered before a device is attached.
/// They are created on `attach_device`, destroyed on `context_lost` or
/// `detach_device`, and created again on `context_restored`.

use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::device::{Device, ClearFlags, DepthFunc, CullFace};
use crate::resource::{ResourceKey, Resource, ResourceRegistry, SharedResource, TypedArray, TextureUpdate, Value};
use crate::command::{Command, CommandDesc, CommandKey, CommandSet, InstanceKey, ProgramCache};
use crate::scheduler::{FrameClock, FrameScheduler, SubscriptionId, TickOutcome};
use crate::renderer::{
    GpuContext, StateCache, Job, JobCallback, FrameCallback, WorkRequests,
    RendererConfig, RendererStats, ResizeEvent, ResizeCallback, ResizeSubscriptionId,
};
use crate::{engine_debug, engine_error, engine_info};

/// Device plus cache, when a device is attached and its context is live
fn live_gpu<'a>(
    device: &'a mut Option<Box<dyn Device>>,
    lost: bool,
    state: &'a mut StateCache,
    debug: bool,
) -> Option<GpuContext<'a>> {
    if lost {
        return None;
    }
    let device = device.as_mut()?;
    Some(GpuContext { device: &mut **device, state, debug })
}

fn unknown_command(key: CommandKey) -> Error {
    Error::InvalidResource(format!("unknown command {:?}", key))
}

/// Device session
pub struct Renderer {
    config: RendererConfig,
    device: Option<Box<dyn Device>>,
    lost: bool,
    state: StateCache,
    scheduler: FrameScheduler<Job, FrameCallback>,
    work: WorkRequests,
    registry: ResourceRegistry,
    programs: ProgramCache,
    commands: CommandSet,
    resize_subscribers: SlotMap<ResizeSubscriptionId, ResizeCallback>,
    last_resize: Option<ResizeEvent>,
    clock: FrameClock,
    needs_rendering: bool,
    stats: RendererStats,
}

impl Renderer {
    /// Create a detached session whose frame clock starts now
    pub fn new(config: RendererConfig) -> Self {
        Self::with_clock(config, FrameClock::new())
    }

    /// Create a detached session with an explicit frame clock
    pub fn with_clock(config: RendererConfig, clock: FrameClock) -> Self {
        Self {
            config,
            device: None,
            lost: false,
            state: StateCache::new(),
            scheduler: FrameScheduler::new(),
            work: WorkRequests::new(),
            registry: ResourceRegistry::new(),
            programs: ProgramCache::new(),
            commands: CommandSet::new(),
            resize_subscribers: SlotMap::with_key(),
            last_resize: None,
            clock,
            needs_rendering: false,
            stats: RendererStats::default(),
        }
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Whether a device is attached (live or lost)
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_context_lost(&self) -> bool {
        self.lost
    }

    /// Whether a draw was requested and not yet performed
    pub fn needs_rendering(&self) -> bool {
        self.needs_rendering
    }

    /// Statistics of the last `render`
    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    /// Last resize applied to the session
    pub fn surface(&self) -> Option<ResizeEvent> {
        self.last_resize
    }

    fn is_live(&self) -> bool {
        self.device.is_some() && !self.lost
    }

    // ===== DEVICE LIFECYCLE =====

    /// Hand the session its device and create everything registered so far
    pub fn attach_device<D: Device + 'static>(&mut self, device: D) -> Result<()> {
        if self.device.is_some() {
            return Err(Error::InitializationFailed("a device is already attached".to_string()));
        }
        self.device = Some(Box::new(device));
        self.lost = false;
        self.state.reset();
        engine_info!("glint::Renderer", "Device attached ({} commands registered)", self.commands.len());
        self.setup_device()
    }

    /// Drop the device, marking every command and resource uninitialized
    pub fn detach_device(&mut self) -> Option<Box<dyn Device>> {
        let device = self.device.take()?;
        self.destroy_gpu_state();
        self.lost = false;
        engine_info!("glint::Renderer", "Device detached");
        Some(device)
    }

    /// The device lost its context: forget every GPU object
    ///
    /// Rendering is suppressed until `context_restored`.
    pub fn context_lost(&mut self) {
        if self.lost {
            return;
        }
        self.lost = true;
        self.destroy_gpu_state();
        engine_info!("glint::Renderer", "Context lost");
    }

    /// The device got a fresh context: create every command again
    pub fn context_restored(&mut self) -> Result<()> {
        if !self.lost {
            return Ok(());
        }
        self.lost = false;
        self.state.reset();
        engine_info!("glint::Renderer", "Context restored");
        self.setup_device()
    }

    fn destroy_gpu_state(&mut self) {
        for (_, command) in self.commands.iter_mut() {
            command.destroy();
        }
        self.registry.destroy_all();
        self.programs.clear();
        self.state.reset();
    }

    fn setup_device(&mut self) -> Result<()> {
        {
            let Some(mut gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) else {
                return Ok(());
            };
            gpu.device.set_clear_color(self.config.clear_color);
            gpu.device.set_clear_depth(self.config.clear_depth);
            gpu.set_depth(Some(DepthFunc::Less));
            gpu.set_cull(Some(CullFace::Back));
            if let Some(surface) = self.last_resize {
                gpu.device.set_viewport(0, 0, surface.drawable_width, surface.drawable_height);
            }
        }

        let result = self.create_commands();
        if self.needs_rendering {
            self.request_rendering();
        }
        self.flush_work();
        result
    }

    fn create_commands(&mut self) -> Result<()> {
        let Some(mut gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) else {
            return Ok(());
        };
        for key in self.commands.keys() {
            if let Some(command) = self.commands.get_mut(key) {
                command.create(key, &mut self.registry, &mut self.programs, &mut gpu, &mut self.work)?;
            }
        }
        Ok(())
    }

    // ===== SURFACE =====

    /// Apply a new logical surface size
    ///
    /// The drawing buffer is `width` x `height` times
    /// `device_pixel_ratio * config.pixel_ratio`. Resize subscribers are
    /// notified and a redraw is requested.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> ResizeEvent {
        let event = ResizeEvent::new(width, height, device_pixel_ratio * self.config.pixel_ratio);
        if let Some(gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) {
            gpu.device.set_viewport(0, 0, event.drawable_width, event.drawable_height);
        }
        self.last_resize = Some(event);

        let subscribers: Vec<ResizeCallback> = self.resize_subscribers.values().cloned().collect();
        for subscriber in subscribers {
            (subscriber.0)(&event);
        }
        self.request_rendering();
        event
    }

    /// `resize` from a winit host's physical size and scale factor
    pub fn resize_physical(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) -> ResizeEvent {
        let logical = size.to_logical::<f32>(scale_factor);
        self.resize(logical.width, logical.height, scale_factor as f32)
    }

    pub fn subscribe_to_resize(&mut self, callback: ResizeCallback) -> ResizeSubscriptionId {
        self.resize_subscribers.insert(callback)
    }

    pub fn unsubscribe_from_resize(&mut self, id: ResizeSubscriptionId) -> bool {
        self.resize_subscribers.remove(id).is_some()
    }

    /// Change the clear color and depth, applied from the next frame
    pub fn set_clear(&mut self, color: [f32; 4], depth: f32) {
        self.config.clear_color = color;
        self.config.clear_depth = depth;
        if let Some(gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) {
            gpu.device.set_clear_color(color);
            gpu.device.set_clear_depth(depth);
        }
        self.request_rendering();
    }

    // ===== RENDERING =====

    /// Ask for a redraw on the next tick
    pub fn request_rendering(&mut self) {
        self.needs_rendering = true;
        if self.is_live() {
            self.scheduler.request_render_job(Job::Render);
        }
    }

    /// Clear the drawing buffer and draw every command in order
    ///
    /// Does nothing while no live device is attached. The first failing
    /// command stops the frame and its error is returned.
    pub fn render(&mut self) -> Result<()> {
        let Some(mut gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) else {
            return Ok(());
        };
        gpu.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        let mut stats = RendererStats::default();
        let mut result = Ok(());
        for key in self.commands.keys() {
            let Some(command) = self.commands.get_mut(key) else { continue };
            match command.render(key, &mut self.registry, &mut self.programs, &mut gpu, &mut self.work) {
                Ok(0) => {}
                Ok(instances) => {
                    stats.draw_calls += 1;
                    stats.instances += instances;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        // this frame already reflects every change made while drawing
        self.work.cancel_render();
        self.needs_rendering = false;
        self.stats = stats;
        if self.config.debug {
            engine_debug!("glint::Renderer", "Rendered {} draw calls, {} instances",
                stats.draw_calls, stats.instances);
        }
        self.flush_work();
        result
    }

    // ===== FRAME LOOP =====

    /// Run one display-refresh tick
    ///
    /// Due animation frame subscribers run first, then every plain job, then
    /// every render job.
    pub fn tick(&mut self, timestamp: f64) -> TickOutcome {
        let info = self.clock.frame_info(timestamp, self.scheduler.frame_number());
        for subscriber in self.scheduler.due_subscribers() {
            (subscriber.0)(self, &info);
            self.flush_work();
        }

        while let Some(job) = self.scheduler.next_job() {
            self.run_job(job);
        }
        self.scheduler.finish_jobs();

        while let Some(job) = self.scheduler.next_render_job() {
            self.run_job(job);
        }
        self.scheduler.finish_render_jobs();

        self.scheduler.end_tick()
    }

    /// Whether the host should request another tick
    pub fn is_frame_requested(&self) -> bool {
        self.scheduler.is_scheduled()
    }

    pub fn frame_number(&self) -> u64 {
        self.scheduler.frame_number()
    }

    /// Queue a caller job for the next tick (deduplicated by callback identity)
    pub fn request_job(&mut self, job: JobCallback) {
        self.scheduler.request_job(Job::Callback(job));
    }

    /// Queue a caller job for the render phase of the next tick
    pub fn request_render_job(&mut self, job: JobCallback) {
        self.scheduler.request_render_job(Job::Callback(job));
    }

    /// Run `callback` on every tick whose frame number is a multiple of `nth_frame`
    pub fn subscribe_to_animation_frame(&mut self, callback: FrameCallback, nth_frame: u64) -> SubscriptionId {
        self.scheduler.subscribe(callback, nth_frame)
    }

    pub fn unsubscribe_from_animation_frame(&mut self, id: SubscriptionId) -> bool {
        self.scheduler.unsubscribe(id)
    }

    fn run_job(&mut self, job: Job) {
        match job {
            Job::Commit(key) => {
                if let Some(mut gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) {
                    self.registry.commit(key, &mut gpu, &mut self.work);
                }
            }
            Job::CountVertices(key) => {
                if let Some(command) = self.commands.get_mut(key) {
                    command.count_vertices(&self.registry);
                }
            }
            Job::Render => {
                if let Err(e) = self.render() {
                    engine_error!("glint::Renderer", "Render failed: {}", e);
                }
            }
            Job::Callback(callback) => (callback.0)(self),
        }
        self.flush_work();
    }

    fn flush_work(&mut self) {
        let (jobs, render_jobs, render) = self.work.take();
        for job in jobs {
            self.scheduler.request_job(job);
        }
        for job in render_jobs {
            self.scheduler.request_render_job(job);
        }
        if render {
            self.request_rendering();
        }
    }

    // ===== RESOURCES =====

    /// Key of the resource described by `desc`, registering it on first use
    ///
    /// The same descriptor always yields the same key. The first name given
    /// sticks.
    pub fn context(&mut self, name: Option<&str>, desc: &SharedResource) -> Result<ResourceKey> {
        let mut gpu = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug);
        let result = self.registry.get_or_create(name, desc, gpu.as_mut(), &mut self.work);
        self.flush_work();
        result
    }

    pub fn resource(&self, key: ResourceKey) -> Option<&Resource> {
        self.registry.get(key)
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Replace a buffer's contents; every command reading it recounts its vertices
    pub fn refill_buffer(&mut self, key: ResourceKey, data: impl Into<TypedArray>) -> Result<()> {
        let mut gpu = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug);
        let result = self.registry.refill(key, data.into(), gpu.as_mut(), &mut self.work);
        self.flush_work();
        result
    }

    /// Write `value` into a buffer at element `offset`, uploaded on the next tick
    pub fn update_buffer(&mut self, key: ResourceKey, value: impl Into<Value>, offset: usize) -> Result<()> {
        let result = self.registry.update_buffer(key, value.into(), offset, &mut self.work);
        self.flush_work();
        result
    }

    /// Write one field of a uniform block, uploaded on the next tick
    pub fn update_uniform(&mut self, key: ResourceKey, field: &str, value: impl Into<Value>) -> Result<()> {
        let result = self.registry.update_uniform(key, field, value.into(), &mut self.work);
        self.flush_work();
        result
    }

    /// Upload a texture sub-region
    pub fn update_texture(&mut self, key: ResourceKey, update: TextureUpdate) -> Result<()> {
        let mut gpu = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug);
        let result = self.registry.update_texture(key, update, gpu.as_mut(), &mut self.work);
        self.flush_work();
        result
    }

    // ===== COMMANDS =====

    /// Register a command, creating it right away when a live device is attached
    ///
    /// A command whose program fails to build is not registered.
    pub fn create_command(&mut self, desc: &CommandDesc) -> Result<CommandKey> {
        let order = self.commands.next_default_order();
        let command = {
            let mut gpu = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug);
            Command::new(desc, order, &mut self.registry, gpu.as_mut(), &mut self.work)
        };
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                self.flush_work();
                return Err(e);
            }
        };

        let key = self.commands.insert(command);
        if let Some(mut gpu) = live_gpu(&mut self.device, self.lost, &mut self.state, self.config.debug) {
            if let Some(command) = self.commands.get_mut(key) {
                if let Err(e) = command.create(key, &mut self.registry, &mut self.programs, &mut gpu, &mut self.work) {
                    command.release(key, &mut self.registry);
                    self.commands.remove(key);
                    self.flush_work();
                    return Err(e);
                }
            }
        }
        self.flush_work();
        Ok(key)
    }

    /// Unregister a command and unbind it from its shared resources
    pub fn remove_command(&mut self, key: CommandKey) -> Result<()> {
        let Some(mut command) = self.commands.remove(key) else {
            return Err(unknown_command(key));
        };
        command.release(key, &mut self.registry);
        self.request_rendering();
        Ok(())
    }

    pub fn command(&self, key: CommandKey) -> Option<&Command> {
        self.commands.get(key)
    }

    /// Registered commands in draw order
    pub fn command_keys(&self) -> Vec<CommandKey> {
        self.commands.keys()
    }

    /// Add an instance; attributes not listed keep their declared default
    pub fn add_instance<N, V>(
        &mut self,
        command: CommandKey,
        values: impl IntoIterator<Item = (N, V)>,
    ) -> Result<InstanceKey>
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(|(n, v)| (n.into(), v.into())).collect();
        let result = match self.commands.get_mut(command) {
            Some(c) => c.add_instance(&mut self.work, values),
            None => Err(unknown_command(command)),
        };
        self.flush_work();
        result
    }

    pub fn delete_instance(&mut self, command: CommandKey, instance: InstanceKey) -> Result<()> {
        let result = match self.commands.get_mut(command) {
            Some(c) => c.delete_instance(&mut self.work, instance),
            None => Err(unknown_command(command)),
        };
        self.flush_work();
        result
    }

    /// Set one instanced attribute of one instance
    pub fn update_instance(
        &mut self,
        command: CommandKey,
        instance: InstanceKey,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let result = match self.commands.get_mut(command) {
            Some(c) => c.update_instance(&mut self.registry, &mut self.work, instance, name, value.into()),
            None => Err(unknown_command(command)),
        };
        self.flush_work();
        result
    }

    pub fn instance_value(&self, command: CommandKey, instance: InstanceKey, name: &str) -> Option<&Value> {
        self.commands.get(command)?.instance_value(instance, name)
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
