//! Plain-text rendering of weeks, shifts and sync states

use shiftboard_core::SyncState;
use shiftboard_model::{Annotation, DayRecord, Session, Shift, WeekView};

pub(crate) fn week(view: &WeekView) {
    println!("{} (from {})", view.week.key, view.week.start);
    for day in &view.days {
        self::day(day);
    }
}

pub(crate) fn day(day: &DayRecord) {
    println!();
    println!("{}  {}", day.date, day.date.format("%A"));
    if day.shifts.is_empty() {
        println!("  (no shifts)");
    }
    for shift in day.shifts_by_start() {
        self::shift(shift);
    }
    for note in &day.notes {
        println!("  note: {}", annotation(note));
    }
}

pub(crate) fn shift(shift: &Shift) {
    let initials = if shift.initials.is_empty() {
        "--"
    } else {
        shift.initials.as_str()
    };
    println!(
        "  [{}] {}-{} {:<20} {:<4} {}/{}",
        shift.id, shift.start_time, shift.end_time, shift.site, initials, shift.bg_color,
        shift.font_color,
    );
    for comment in &shift.comments {
        println!("      comment: {}", annotation(comment));
    }
}

pub(crate) fn session(session: &Session) {
    println!("{} (access: {})", session.author_label(), session.has_access);
}

pub(crate) fn state(state: &SyncState) {
    match state {
        SyncState::Idle => println!("-- idle"),
        SyncState::Subscribing { week } => println!("-- subscribing to {week}"),
        SyncState::Synced(view) => {
            println!("-- synced");
            self::week(view);
        }
        SyncState::Error { week, message } => println!("-- error on {week}: {message}"),
    }
}

fn annotation(entry: &Annotation) -> String {
    format!(
        "{} ({}, {})",
        entry.text,
        entry.user,
        entry.date.format("%Y-%m-%d %H:%M UTC")
    )
}
