use std::sync::{Arc, Mutex};
use std::time::Duration;
use veneer_core::ManualScheduler;
use veneer_theme::{
    Change, ChangeEvent, ChangeOrigin, Color, ColorOverrides, ColorToken, SharedOrigin,
    SimulatedEnvironment, ThemeContext, ThemeMode, ThemePreferencesPatch, TransitionState,
};

struct Tab {
    scheduler: Arc<ManualScheduler>,
    ctx: ThemeContext,
    events: Arc<Mutex<Vec<ChangeEvent>>>,
    _listener: veneer_theme::ListenerHandle,
}

impl Tab {
    fn open(origin: &SharedOrigin, env: &SimulatedEnvironment) -> Self {
        let scheduler = Arc::new(ManualScheduler::new());
        let ctx = ThemeContext::builder()
            .backend(origin.open_context())
            .environment(env.clone())
            .scheduler(scheduler.clone())
            .mount();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let listener = ctx.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let tab = Self {
            scheduler,
            ctx,
            events,
            _listener: listener,
        };
        tab.settle();
        tab
    }

    fn settle(&self) {
        self.scheduler.run_frame();
        self.scheduler.tick(Duration::from_secs(1));
    }

    fn take_events(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[test]
fn writer_is_not_notified_of_its_own_write() {
    let origin = SharedOrigin::new();
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let _b = Tab::open(&origin, &env);

    a.ctx.set_theme(ThemeMode::Dark);
    assert_eq!(a.ctx.process_pending(), 0);

    let events = a.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].change, Change::Mode(ThemeMode::Dark));
    assert_eq!(events[0].origin, ChangeOrigin::Local);
}

#[test]
fn other_contexts_follow_without_writing_back() {
    let origin = SharedOrigin::new();
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let b = Tab::open(&origin, &env);

    a.ctx.set_theme(ThemeMode::Dark);
    assert_eq!(b.ctx.theme_mode(), ThemeMode::Auto);

    assert_eq!(b.ctx.process_pending(), 1);
    assert_eq!(b.ctx.theme_mode(), ThemeMode::Dark);
    assert!(b.ctx.is_dark_mode());

    let events = b.take_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].originated_externally());
    assert_eq!(events[0].change, Change::Mode(ThemeMode::Dark));

    // b applied the change without persisting it again, so nothing echoes back
    assert_eq!(a.ctx.process_pending(), 0);
    assert_eq!(origin.peek("veneer-theme-mode").as_deref(), Some("dark"));
}

#[test]
fn external_change_is_bracketed_like_a_local_one() {
    let origin = SharedOrigin::new();
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let b = Tab::open(&origin, &env);

    a.ctx.set_theme(ThemeMode::Dark);
    b.ctx.process_pending();
    assert_eq!(b.ctx.transition_state(), TransitionState::Transitioning);

    b.settle();
    assert_eq!(b.ctx.transition_state(), TransitionState::Idle);
}

#[test]
fn racing_writers_converge_on_the_stored_value() {
    let origin = SharedOrigin::new();
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let b = Tab::open(&origin, &env);

    a.ctx.set_theme(ThemeMode::Dark);
    b.ctx.set_theme(ThemeMode::Light);

    a.ctx.process_pending();
    b.ctx.process_pending();

    assert_eq!(origin.peek("veneer-theme-mode").as_deref(), Some("light"));
    assert_eq!(a.ctx.theme_mode(), ThemeMode::Light);
    assert_eq!(b.ctx.theme_mode(), ThemeMode::Light);
}

#[test]
fn preferences_and_custom_colors_propagate() {
    let origin = SharedOrigin::new();
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let b = Tab::open(&origin, &env);
    let red = Color::from_hex(0xE11D48);

    a.ctx
        .update_theme_preferences(ThemePreferencesPatch::new().high_contrast(true));
    a.ctx
        .set_custom_colors(Some(ColorOverrides::new().with(ColorToken::Primary, red)));
    b.ctx.process_pending();

    assert!(b.ctx.high_contrast());
    assert_eq!(b.ctx.color(ColorToken::Primary), red);

    a.ctx.reset_preferences();
    b.ctx.process_pending();

    assert!(!b.ctx.high_contrast());
    assert_eq!(b.ctx.theme_mode(), ThemeMode::Auto);
    assert_eq!(
        b.ctx.color(ColorToken::Primary),
        b.ctx.theme().colors.primary
    );
}

#[test]
fn each_context_resolves_auto_against_its_own_environment() {
    let origin = SharedOrigin::new();
    let light_env = SimulatedEnvironment::new();
    let dark_env = SimulatedEnvironment::dark();
    let a = Tab::open(&origin, &light_env);
    let b = Tab::open(&origin, &dark_env);

    a.ctx.set_theme(ThemeMode::Dark);
    b.ctx.process_pending();
    a.ctx.set_theme(ThemeMode::Auto);
    b.ctx.process_pending();

    assert_eq!(b.ctx.theme_mode(), ThemeMode::Auto);
    assert!(!a.ctx.is_dark_mode());
    assert!(b.ctx.is_dark_mode());
}

#[test]
fn session_only_value_yields_to_a_later_shared_write() {
    let origin = SharedOrigin::new();
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let b = Tab::open(&origin, &env);

    origin.set_available(false);
    a.ctx.set_theme(ThemeMode::Dark);
    assert!(a.ctx.storage_manager().is_degraded());
    origin.set_available(true);
    a.take_events();

    b.ctx.set_theme(ThemeMode::Light);
    assert_eq!(a.ctx.process_pending(), 1);

    assert_eq!(origin.peek("veneer-theme-mode").as_deref(), Some("light"));
    assert_eq!(a.ctx.theme_mode(), ThemeMode::Light);
    assert_eq!(a.ctx.storage_manager().get_mode(), ThemeMode::Light);
    assert_eq!(
        a.take_events(),
        vec![ChangeEvent {
            change: Change::Mode(ThemeMode::Light),
            origin: ChangeOrigin::External,
        }]
    );
}

#[test]
fn lagging_context_resyncs_from_storage() {
    let origin = SharedOrigin::with_capacity(2);
    let env = SimulatedEnvironment::new();
    let a = Tab::open(&origin, &env);
    let b = Tab::open(&origin, &env);
    let red = Color::from_hex(0xE11D48);

    a.ctx.set_theme(ThemeMode::Dark);
    a.ctx
        .update_theme_preferences(ThemePreferencesPatch::new().high_contrast(true));
    a.ctx
        .set_custom_colors(Some(ColorOverrides::new().with(ColorToken::Primary, red)));
    a.ctx.set_theme(ThemeMode::Light);

    b.ctx.process_pending();

    // the high contrast write was lost from the channel but not from storage
    assert!(b.ctx.high_contrast());
    assert_eq!(b.ctx.theme_mode(), ThemeMode::Light);
    assert_eq!(b.ctx.color(ColorToken::Primary), red);
    assert!(b
        .take_events()
        .iter()
        .any(|e| e.change == Change::Resync && e.originated_externally()));
}
