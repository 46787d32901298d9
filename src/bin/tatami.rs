use clap::Parser;
use tatami::common::log;

#[derive(Parser)]
struct Cli {
    /// Disable animations; windows jump straight to their targets.
    #[arg(long)]
    no_animate: bool,

    /// Outer and inter-window gap in points.
    #[arg(long)]
    gap: Option<f64>,

    /// Seconds between periodic discovery scans.
    #[arg(long)]
    period: Option<f64>,

    /// Print one discovery snapshot as JSON and exit.
    #[arg(long)]
    one_shot_scan: bool,
}

fn main() {
    sigpipe::reset();
    let opt: Cli = Parser::parse();

    if std::env::var_os("RUST_BACKTRACE").is_none() {
        // SAFETY: We are single threaded at this point.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    log::init_logging();
    install_panic_hook();

    let settings = settings(&opt);
    if let Err(err) = run(opt, settings) {
        eprintln!("tatami: {err:#}");
        std::process::exit(1);
    }
}

fn settings(opt: &Cli) -> tatami::common::config::Settings {
    let mut settings = tatami::common::config::Settings::default();
    settings.animate &= !opt.no_animate;
    if let Some(gap) = opt.gap {
        settings.gap = gap.max(0.0);
    }
    if let Some(period) = opt.period {
        settings.discovery_period = std::time::Duration::from_secs_f64(period.max(0.1));
    }
    settings
}

#[cfg(target_os = "macos")]
fn run(opt: Cli, settings: tatami::common::config::Settings) -> anyhow::Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use anyhow::Context;
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
    use objc2_foundation::MainThreadMarker;
    use tatami::actor::animator::Animator;
    use tatami::actor::discovery::{self, Discovery};
    use tatami::actor::hotkeys::HotkeyDispatcher;
    use tatami::actor::menu_bar::MenuBar;
    use tatami::actor::mouse::Mouse;
    use tatami::actor::reactor::Reactor;
    use tatami::actor::spaces::SpaceManager;
    use tatami::sys::executor::Executor;
    use tatami::sys::mac::{self, MacSystem};
    use tatami::sys::system::WindowSystem;
    use tokio_util::sync::CancellationToken;

    let mtm = MainThreadMarker::new().expect("must start on the main thread");
    {
        let app = NSApplication::sharedApplication(mtm);
        let _ = app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
        app.finishLaunching();
    }

    mac::accessibility::ensure_accessibility_permission();

    let mac_system = MacSystem::new(mtm);
    let system: Arc<dyn WindowSystem> = mac_system.clone();

    if opt.one_shot_scan {
        let snapshot = discovery::scan(&*system, false);
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let throwing = Arc::new(AtomicBool::new(false));

    let (animator, animator_tx) = Animator::new(system.clone(), settings.clone());
    let (reactor, reactor_tx) =
        Reactor::new(system.clone(), settings.clone(), animator_tx.clone(), throwing.clone());
    let (discovery_actor, discovery_tx) =
        Discovery::new(system.clone(), settings.clone(), reactor_tx.clone(), shutdown.clone());
    let (spaces_actor, spaces_tx) = SpaceManager::new(
        system.clone(),
        throwing.clone(),
        discovery_tx.clone(),
        reactor_tx.clone(),
        animator_tx.clone(),
    );
    let (hotkeys_actor, hotkeys_tx) = HotkeyDispatcher::new(
        reactor_tx.clone(),
        spaces_tx.clone(),
        discovery_tx.clone(),
        shutdown.clone(),
    );
    let (mouse_actor, mouse_tx) = Mouse::new(reactor_tx.clone(), throwing.clone());
    let (menu_actor, menu_tx) =
        MenuBar::new(reactor_tx.clone(), discovery_tx.clone(), shutdown.clone());

    std::thread::Builder::new()
        .name("tatami-discovery".into())
        .spawn(move || Executor::run(discovery_actor.run()))
        .context("spawning the discovery worker")?;

    std::thread::Builder::new()
        .name("tatami-animator".into())
        .spawn(move || Executor::run(animator.run()))
        .context("spawning the animator worker")?;

    // The coordinator worker owns every model mutation; the process main
    // thread below only runs the Cocoa run loop and posts messages.
    std::thread::Builder::new()
        .name("tatami-coordinator".into())
        .spawn(move || {
            Executor::run(async move {
                tokio::join!(
                    reactor.run(),
                    spaces_actor.run(),
                    hotkeys_actor.run(),
                    mouse_actor.run(),
                    menu_actor.run(),
                );
            })
        })
        .context("spawning the coordinator worker")?;

    {
        let shutdown = shutdown.clone();
        std::thread::Builder::new()
            .name("tatami-shutdown".into())
            .spawn(move || {
                Executor::run(shutdown.cancelled());
                tracing::info!("shutting down");
                std::process::exit(0);
            })
            .context("spawning the shutdown watcher")?;
    }

    let _notifications =
        mac::notifications::NotificationCenter::install(mtm, mac_system, spaces_tx.clone());
    let _hotkey_tap = mac::event_tap::install_hotkey_tap(hotkeys_tx.clone());
    let _mouse_tap = mac::event_tap::install_mouse_tap(mouse_tx.clone());
    let _status = mac::status_item::StatusIcon::new(mtm, menu_tx.clone());

    discovery_tx.send(discovery::Request::ScanNow);
    tracing::info!("tatami is managing windows");

    NSApplication::sharedApplication(mtm).run();
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run(opt: Cli, _settings: tatami::common::config::Settings) -> anyhow::Result<()> {
    let _ = opt.one_shot_scan;
    anyhow::bail!("tatami manages macOS windows; nothing to do on this platform");
}

#[cfg(panic = "unwind")]
fn install_panic_hook() {
    // Abort on panic instead of propagating panics to the main thread.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}

#[cfg(not(panic = "unwind"))]
fn install_panic_hook() {}
