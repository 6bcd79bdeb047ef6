//! Calendar-attachment strategy — line-oriented ICS scanning.

use crate::detect::TaskCandidate;
use crate::mail::{Attachment, ParsedMessage};

/// Scan attachments in order; one candidate per qualifying part.
/// Parts without both a DTSTART and a SUMMARY are skipped.
pub fn scan(message: &ParsedMessage) -> Vec<TaskCandidate> {
    message
        .attachments
        .iter()
        .filter(|att| is_calendar(att))
        .filter_map(|att| scan_ics(&String::from_utf8_lossy(&att.data)))
        .collect()
}

fn is_calendar(att: &Attachment) -> bool {
    att.content_type.eq_ignore_ascii_case("text/calendar")
        || att.filename.to_ascii_lowercase().ends_with(".ics")
}

/// Extract the first DTSTART, SUMMARY, and RRULE values from ICS text.
fn scan_ics(text: &str) -> Option<TaskCandidate> {
    let mut dtstart = None;
    let mut summary = None;
    let mut rrule = None;

    for raw in text.lines() {
        let line = raw.trim_end();
        if dtstart.is_none()
            && let Some(value) = prop_value(line, "DTSTART")
        {
            dtstart = Some(value.to_string());
        } else if summary.is_none()
            && let Some(value) = prop_value(line, "SUMMARY")
        {
            summary = Some(value.to_string());
        } else if rrule.is_none()
            && let Some(value) = prop_value(line, "RRULE")
        {
            rrule = Some(value.to_string());
        }

        if dtstart.is_some() && summary.is_some() && rrule.is_some() {
            break;
        }
    }

    match (dtstart, summary) {
        (Some(due), Some(title)) => Some(TaskCandidate {
            title,
            due,
            recurrence: rrule,
        }),
        _ => None,
    }
}

/// Value of an ICS content line, tolerating property parameters
/// (`DTSTART;TZID=Europe/Berlin:20240101T090000`).
fn prop_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    match rest.as_bytes().first() {
        Some(b':') => Some(rest[1..].trim()),
        Some(b';') => rest.split_once(':').map(|(_, value)| value.trim()),
        _ => None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const INVITE: &str = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:20240101T090000Z\r\nSUMMARY:Standup\r\nRRULE:FREQ=WEEKLY\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    fn make_attachment(content_type: &str, filename: &str, body: &str) -> Attachment {
        Attachment {
            content_type: content_type.into(),
            filename: filename.into(),
            data: body.as_bytes().to_vec(),
        }
    }

    fn message_with(attachments: Vec<Attachment>) -> ParsedMessage {
        ParsedMessage {
            from: "carol@example.com".into(),
            subject: "Invite".into(),
            text: "see attachment".into(),
            html: String::new(),
            headers: vec![],
            attachments,
        }
    }

    #[test]
    fn extracts_event_from_invite() {
        let msg = message_with(vec![make_attachment("text/calendar", "invite.ics", INVITE)]);
        let candidates = scan(&msg);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Standup");
        assert_eq!(candidates[0].due, "20240101T090000Z");
        assert_eq!(candidates[0].recurrence.as_deref(), Some("FREQ=WEEKLY"));
    }

    #[test]
    fn ics_extension_qualifies_regardless_of_type() {
        let msg = message_with(vec![make_attachment(
            "application/octet-stream",
            "Meeting.ICS",
            INVITE,
        )]);
        assert_eq!(scan(&msg).len(), 1);
    }

    #[test]
    fn non_calendar_attachments_skipped() {
        let msg = message_with(vec![make_attachment("image/png", "photo.png", "not ics")]);
        assert!(scan(&msg).is_empty());
    }

    #[test]
    fn property_parameters_tolerated() {
        let body = "DTSTART;TZID=Europe/Berlin:20240315T140000\nSUMMARY:Review\n";
        let msg = message_with(vec![make_attachment("text/calendar", "r.ics", body)]);
        let candidates = scan(&msg);
        assert_eq!(candidates[0].due, "20240315T140000");
        assert_eq!(candidates[0].title, "Review");
        assert!(candidates[0].recurrence.is_none());
    }

    #[test]
    fn missing_summary_skips_attachment() {
        let body = "BEGIN:VEVENT\nDTSTART:20240101T090000Z\nEND:VEVENT\n";
        let msg = message_with(vec![make_attachment("text/calendar", "x.ics", body)]);
        assert!(scan(&msg).is_empty());
    }

    #[test]
    fn first_values_win() {
        let body = "SUMMARY:First\nDTSTART:20240101T090000Z\nSUMMARY:Second\nDTSTART:20250101T090000Z\n";
        let msg = message_with(vec![make_attachment("text/calendar", "x.ics", body)]);
        let candidates = scan(&msg);
        assert_eq!(candidates[0].title, "First");
        assert_eq!(candidates[0].due, "20240101T090000Z");
    }

    #[test]
    fn one_candidate_per_qualifying_attachment() {
        let second = "DTSTART:20240202T100000Z\nSUMMARY:Planning\n";
        let msg = message_with(vec![
            make_attachment("text/calendar", "a.ics", INVITE),
            make_attachment("text/calendar", "b.ics", second),
        ]);
        let candidates = scan(&msg);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Standup");
        assert_eq!(candidates[1].title, "Planning");
    }

    #[test]
    fn prefix_must_be_a_whole_property_name() {
        // DTSTARTX is not DTSTART
        let body = "DTSTARTX:20240101T090000Z\nSUMMARY:Oops\n";
        let msg = message_with(vec![make_attachment("text/calendar", "x.ics", body)]);
        assert!(scan(&msg).is_empty());
    }
}
