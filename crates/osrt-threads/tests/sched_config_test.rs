//! Scheduling configuration policy: the hard-failure and soft-fallback
//! halves of priority validation, and affinity translation.

use std::ffi::c_void;

use log::{Level, LevelFilter, Metadata, Record};
use parking_lot::Mutex;

use osrt_threads::{RtError, SchedClass, ThreadAttr, create};

static WARNINGS: Mutex<Vec<String>> = Mutex::new(Vec::new());

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Warn {
            WARNINGS.lock().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

fn install_logger() {
    // set_logger fails after the first call in this binary; that is fine.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Warn);
}

fn echo(arg: *mut c_void) -> usize {
    arg as usize
}

#[test]
fn default_class_with_nonzero_priority_fails_hard() {
    let attr = ThreadAttr {
        sched_priority: 1,
        ..ThreadAttr::new()
    };
    assert_eq!(
        create("hard-fail", &attr, echo, std::ptr::null_mut()).err(),
        Some(RtError::Error)
    );
}

#[test]
fn out_of_range_timeshare_priority_warns_and_still_creates() {
    install_logger();

    let attr = ThreadAttr {
        sched_class: SchedClass::Timeshare,
        sched_priority: 10_000,
        ..ThreadAttr::new()
    };
    let thread = create("ts-fallback", &attr, echo, 5 as *mut c_void).expect("create failed");
    assert_eq!(thread.join(), Ok(5));

    let warned = WARNINGS
        .lock()
        .iter()
        .any(|w| w.contains("ts-fallback") && w.contains("10000"));
    assert!(warned, "out-of-range priority must emit a warning");

    // The valid half of the same policy: priority 0 is in range for the
    // timesharing class, so no warning may be emitted for it.
    let attr = ThreadAttr {
        sched_class: SchedClass::Timeshare,
        sched_priority: 0,
        ..ThreadAttr::new()
    };
    let thread = create("ts-valid", &attr, echo, 6 as *mut c_void).expect("create failed");
    assert_eq!(thread.join(), Ok(6));
    assert!(
        !WARNINGS.lock().iter().any(|w| w.contains("ts-valid")),
        "in-range priority must not warn"
    );
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn affinity_to_first_cpu_is_accepted() {
    let attr = ThreadAttr {
        affinity: vec![0],
        ..ThreadAttr::new()
    };
    let thread = create("pinned", &attr, echo, 9 as *mut c_void).expect("create failed");
    assert_eq!(thread.join(), Ok(9));
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn affinity_with_out_of_range_cpu_id_fails() {
    let attr = ThreadAttr {
        affinity: vec![0, 1_000_000],
        ..ThreadAttr::new()
    };
    assert_eq!(
        create("overpinned", &attr, echo, std::ptr::null_mut()).err(),
        Some(RtError::Error)
    );
}
