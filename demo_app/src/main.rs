//! Multiform demo application
//!
//! Drives a menu and a gameplay multiform through activation switches and
//! scripted display changes against a stub window sink. Run with
//! `RUST_LOG=info` to watch the lifecycle.

use multiform_engine::foundation::logging;
use multiform_engine::prelude::*;

/// Window sink that logs every batch instead of talking to a real backend
struct ConsoleSink;

impl WindowSink for ConsoleSink {
    fn apply(&mut self, settings: &WindowSettings, changed: WindowChanges) -> bool {
        log::info!(
            "window <- {} fullscreen={} borderless={} vsync={} mouse={} (changed: {:?})",
            settings.resolution,
            settings.fullscreen,
            settings.borderless,
            settings.vsync,
            settings.mouse_visible,
            changed
        );
        true
    }
}

/// Particle-ish form payload that just integrates an angle
struct Spinner {
    angle: f32,
    speed: f32,
}

impl FormBehavior for Spinner {
    fn update(&mut self, delta_time: f32) {
        self.angle += self.speed * delta_time;
    }
}

struct MenuMultiform {
    core: MultiformCore,
}

impl MenuMultiform {
    fn new() -> Self {
        Self {
            core: MultiformCore::of::<Self>(None, MultiformDescriptor::new().with_name("menu")),
        }
    }
}

impl Multiform for MenuMultiform {
    fn core(&self) -> &MultiformCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MultiformCore {
        &mut self.core
    }

    fn construct(&mut self, _args: &MultiformArgs) {
        self.core
            .add_forms([
                Form::named("title", Box::new(())),
                Form::named("buttons/play", Box::new(())),
                Form::named("buttons/quit", Box::new(())),
            ])
            .expect("menu form names are unique");
        self.core.set_renderer(|| log::debug!("rendering menu"));
    }

    fn deconstruct(&mut self) {
        // Full teardown; the next activation rebuilds the menu from scratch.
        self.core.clear_forms(true);
    }
}

struct GameplayMultiform {
    core: MultiformCore,
    frames_this_run: u32,
}

impl GameplayMultiform {
    fn new() -> Self {
        Self {
            core: MultiformCore::of::<Self>(
                None,
                MultiformDescriptor::new()
                    .with_name("gameplay")
                    .reconstructable(),
            ),
            frames_this_run: 0,
        }
    }
}

impl Multiform for GameplayMultiform {
    fn core(&self) -> &MultiformCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MultiformCore {
        &mut self.core
    }

    fn construct(&mut self, args: &MultiformArgs) {
        let particles = args.get_int("particles").unwrap_or(3);
        for index in 0..particles {
            self.core.add_anonymous_form_in(
                "fx/particles",
                Form::anonymous(Box::new(Spinner {
                    angle: 0.0,
                    speed: 1.0 + index as f32 * 0.25,
                })),
            );
        }
        self.core
            .set_renderer(|| log::debug!("rendering gameplay"));
        self.frames_this_run = 0;
    }

    fn reconstruct(&mut self, _args: &MultiformArgs) {
        // Forms survived deactivation; just reset the per-run counter.
        log::info!("gameplay resumed with state intact");
        self.frames_this_run = 0;
    }

    fn update(&mut self, _delta_time: f32) {
        self.frames_this_run += 1;
        if self.frames_this_run == 5 {
            self.core
                .deactivate()
                .expect("gameplay is registered with the manager");
        }
    }
}

fn run_frames(manager: &mut MultiformManager, timer: &mut Timer, frames: u32) {
    for _ in 0..frames {
        timer.tick();
        manager.update(timer.delta_time());
        if let Err(err) = manager.render() {
            log::warn!("render skipped: {}", err);
        }
    }
}

fn main() {
    logging::init();

    let display_config = DisplayConfig {
        resolution_policy: ResolutionPolicy::LandscapeOnly,
        reference_resolution: Resolution::new(1920, 1080),
        ..DisplayConfig::default()
    };
    let mut display = DisplayManager::new(
        display_config,
        Box::new(ConsoleSink),
        Box::new(MemoryOptions::new()),
    );

    display.on_resolution_change(|change| {
        log::info!(
            "ui rescaling: {} -> {} (scale {:.2})",
            change.previous,
            change.current,
            change.scale
        );
    });
    let verbose_handle = display.on_resolution_change(|change| {
        log::info!("aspect ratio now {:.3}", change.current.aspect_ratio());
    });

    let mut manager = MultiformManager::new();
    manager
        .register(Box::new(MenuMultiform::new()))
        .expect("menu registers once");
    manager
        .register(Box::new(GameplayMultiform::new()))
        .expect("gameplay registers once");

    let mut timer = Timer::new();

    manager
        .switch_to("menu", &MultiformArgs::new())
        .expect("menu is registered");
    run_frames(&mut manager, &mut timer, 3);

    let gameplay_args = MultiformArgs::new().with_arg("particles", ArgValue::Int(5));
    manager
        .switch_to("gameplay", &gameplay_args)
        .expect("gameplay is registered");
    if let Some(gameplay) = manager.get("gameplay") {
        let particles = gameplay
            .core()
            .anonymous_forms("fx/particles")
            .map(<[Form]>::len)
            .unwrap_or(0);
        log::info!("gameplay running with {} particles", particles);
    }

    // The gameplay multiform deactivates itself on its fifth update.
    run_frames(&mut manager, &mut timer, 6);
    assert_eq!(manager.active(), None);
    log::info!("gameplay deactivated itself; switching back in");

    // Second activation takes the reconstruct path.
    manager
        .switch_to("gameplay", &gameplay_args)
        .expect("gameplay is registered");
    run_frames(&mut manager, &mut timer, 2);

    display
        .set_resolution(Resolution::new(1920, 1080))
        .expect("landscape resolution satisfies the policy");
    display.toggle_fullscreen().expect("fullscreen is toggleable");
    display.apply_changes();

    // Drop the verbose listener; only the rescale listener sees this one.
    display.remove_resolution_listener(verbose_handle);
    display
        .set_resolution(Resolution::new(2560, 1440))
        .expect("landscape resolution satisfies the policy");
    display.apply_changes();

    let activations = manager
        .get("gameplay")
        .map(|gameplay| gameplay.core().times_activated())
        .unwrap_or(0);
    log::info!(
        "demo complete: {} frames, gameplay activated {} times, final display {}",
        timer.frame_count(),
        activations,
        display.resolution()
    );
}
