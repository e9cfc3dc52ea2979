//! End-to-end control flow: registry, gating, admin commands, persistence

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::thread;

use groupctl_core::{
    Admin, AdminCommand, CommandContext, ControlConfig, ControlOptions, DegradedPolicy, Gate,
    GroupConfig, GroupScoped, GroupState, Registry, StoreConfig,
};
use groupctl_store::Condition;
use tempfile::TempDir;

/// Minimal stand-in for a dispatch-layer message event.
struct GroupMessage {
    group_id: i64,
}

impl GroupScoped for GroupMessage {
    fn group_id(&self) -> i64 {
        self.group_id
    }
}

fn stored_row(registry: &Registry, service: &str, gid: i64) -> Option<GroupConfig> {
    registry
        .store()
        .find(service, &Condition::eq("gid", gid))
        .unwrap()
}

#[test]
fn weather_example() {
    let registry = Registry::in_memory().unwrap();
    let weather = registry
        .register("weather", ControlOptions::with_help("weather forecast"))
        .unwrap();
    let gate = weather.handler::<GroupMessage>();

    assert!(gate(&GroupMessage { group_id: 12345 }));
    assert_eq!(
        stored_row(&registry, "weather", 12345),
        Some(GroupConfig {
            gid: 12345,
            disable: 0
        })
    );

    weather.disable(12345).unwrap();
    assert!(!gate(&GroupMessage { group_id: 12345 }));
    assert!(!gate(&GroupMessage { group_id: 12345 }));
}

#[test]
fn fresh_group_disabled_by_default() {
    let registry = Registry::in_memory().unwrap();
    let setu = registry
        .register("setu", ControlOptions::default().disabled_by_default())
        .unwrap();

    assert_eq!(setu.check(1), Gate::Blocked);
    assert_eq!(
        stored_row(&registry, "setu", 1),
        Some(GroupConfig { gid: 1, disable: 1 })
    );
}

#[test]
fn services_are_independent() {
    let registry = Registry::in_memory().unwrap();
    let weather = registry.register("weather", ControlOptions::default()).unwrap();
    let music = registry.register("music", ControlOptions::default()).unwrap();

    weather.disable(1).unwrap();
    assert_eq!(weather.check(1), Gate::Blocked);
    assert_eq!(music.check(1), Gate::Allowed);
}

#[test]
fn admin_text_commands_drive_gating() {
    let registry = Registry::in_memory().unwrap();
    let weather = registry
        .register("weather", ControlOptions::with_help("weather forecast"))
        .unwrap();
    let admin = Admin::new(&registry);
    let ctx = CommandContext::group_admin(42);

    let run = |text: &str| admin.execute(&AdminCommand::parse(text).unwrap(), &ctx);

    assert_eq!(run("禁用 weather"), "已关闭服务: weather");
    assert_eq!(weather.check(42), Gate::Blocked);
    assert_eq!(run("enable weather"), "已启用服务: weather");
    assert_eq!(weather.check(42), Gate::Allowed);
    assert_eq!(run("用法 weather"), "weather forecast");
    assert_eq!(run("service_list"), "---服务列表---\n1: weather");
    assert_eq!(run("disable nothing"), "没有找到指定服务!");
    assert_eq!(weather.state(42).unwrap(), GroupState::Enabled);
}

#[test]
fn concurrent_writes_leave_one_consistent_row() {
    let registry = Registry::in_memory().unwrap();
    let control = registry.register("weather", ControlOptions::default()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                for j in 0..25 {
                    if (i + j) % 2 == 0 {
                        control.enable(7).unwrap();
                    } else {
                        control.disable(7).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(control.configured_groups().unwrap(), 1);
    assert_ne!(control.state(7).unwrap(), GroupState::Unconfigured);

    control.disable(7).unwrap();
    assert_eq!(control.check(7), Gate::Blocked);
}

#[test]
fn stored_state_matches_last_admitted_write() {
    let registry = Registry::in_memory().unwrap();
    let control = registry.register("weather", ControlOptions::default()).unwrap();
    control.enable(7).unwrap();

    // Writers log each call while holding `last`, so the log order is the
    // order in which the control admitted them. Readers run unordered.
    let last = Arc::new(Mutex::new(0_i64));
    let writers: Vec<_> = (0..6)
        .map(|i| {
            let control = Arc::clone(&control);
            let last = Arc::clone(&last);
            thread::spawn(move || {
                for j in 0..30 {
                    let mut last = last.lock().unwrap();
                    let disable = (i * 7 + j * 3) % 2;
                    if disable == 1 {
                        control.disable(7).unwrap();
                    } else {
                        control.enable(7).unwrap();
                    }
                    *last = disable;
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                for _ in 0..50 {
                    let gate = control.check(7);
                    assert!(!gate.is_degraded(), "{gate}");
                    assert_ne!(control.state(7).unwrap(), GroupState::Unconfigured);
                }
            })
        })
        .collect();
    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let expected = *last.lock().unwrap();
    assert_eq!(
        stored_row(&registry, "weather", 7),
        Some(GroupConfig {
            gid: 7,
            disable: expected
        })
    );
    assert_eq!(control.check(7).permits(), expected == 0);
    assert_eq!(control.configured_groups().unwrap(), 1);
}

#[test]
fn concurrent_first_contact_writes_one_default() {
    let registry = Registry::in_memory().unwrap();
    let control = registry.register("weather", ControlOptions::default()).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let control = Arc::clone(&control);
            thread::spawn(move || control.check(99))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Gate::Allowed);
    }
    assert_eq!(control.configured_groups().unwrap(), 1);
}

#[test]
fn state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        path: dir.path().join("data").join("control").join("plugins.db"),
    };

    {
        let registry = Registry::open(&config).unwrap();
        let weather = registry.register("weather", ControlOptions::default()).unwrap();
        weather.disable(5).unwrap();
    }

    let registry = Registry::open(&config).unwrap();
    let weather = registry.register("weather", ControlOptions::default()).unwrap();
    assert_eq!(weather.check(5), Gate::Blocked);
}

#[test]
fn store_failure_degrades_per_policy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plugins.db");
    let registry = Registry::open(&StoreConfig { path: path.clone() }).unwrap();

    let closed = registry
        .register("closed", ControlOptions::default().disabled_by_default())
        .unwrap();
    let open = registry
        .register(
            "open",
            ControlOptions {
                disable_on_default: true,
                on_store_error: DegradedPolicy::FailOpen,
                ..ControlOptions::default()
            },
        )
        .unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(r#"DROP TABLE "closed"; DROP TABLE "open";"#)
        .unwrap();

    let gate = closed.check(1);
    assert!(gate.is_degraded());
    assert!(!gate.permits());

    let gate = open.check(1);
    assert!(gate.is_degraded());
    assert!(gate.permits());

    assert!(closed.enable(1).is_err());
}

#[test]
fn register_all_from_config() {
    let config = ControlConfig::from_toml_str(
        r#"
        [services.weather]
        help = "weather forecast"

        [services.setu]
        disable_on_default = true
        "#,
    )
    .unwrap();
    let registry = Registry::in_memory().unwrap();
    let controls = registry.register_all(&config).unwrap();
    assert_eq!(controls.len(), 2);

    let mut names = Vec::new();
    registry.for_each(|name, control| {
        names.push(name.to_string());
        assert_eq!(control.service(), name);
        ControlFlow::Continue(())
    });
    assert_eq!(names, vec!["setu", "weather"]);
    assert_eq!(registry.lookup("setu").unwrap().check(3), Gate::Blocked);
}
