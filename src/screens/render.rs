use crate::flow::Frame;
use crate::models::SessionStatus;

const GREY_BASE: u8 = 232;
const GREY_LEVELS: u8 = 24;

/// 256-colour greyscale code for an intensity in `[0, 1]`.
pub fn grey_code(intensity: f64) -> u8 {
    let clamped = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    GREY_BASE + (clamped * f64::from(GREY_LEVELS - 1)).round() as u8
}

pub fn state_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Running => "running",
        SessionStatus::Paused => "paused",
        SessionStatus::Completed => "completed",
    }
}

pub fn frame_line(frame: &Frame) -> String {
    format!(
        "\x1b[38;5;{grey}m{phrase}\x1b[0m  {count} of {target}  [{state}]",
        grey = grey_code(frame.intensity),
        phrase = frame.phrase,
        count = frame.display_count,
        target = frame.target_count,
        state = state_label(frame.run_state),
    )
}

pub fn command_hint(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Completed => "x: again  q: leave",
        _ => "p: pause  r: resume  t: toggle  x: reset  c: cancel  q: leave",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::state::Phase;

    fn frame(intensity: f64, run_state: SessionStatus) -> Frame {
        Frame {
            phrase: "SubhanAllah".into(),
            intensity,
            display_count: 7,
            target_count: 33,
            run_state,
            phase: Phase::Holding,
        }
    }

    #[test]
    fn intensity_maps_onto_grey_ramp() {
        assert_eq!(grey_code(0.0), 232);
        assert_eq!(grey_code(1.0), 255);
        assert_eq!(grey_code(0.5), 244);
        assert_eq!(grey_code(-3.0), 232);
        assert_eq!(grey_code(7.0), 255);
        assert_eq!(grey_code(f64::NAN), 232);
    }

    #[test]
    fn frame_line_shows_count_and_state() {
        let line = frame_line(&frame(1.0, SessionStatus::Paused));
        assert!(line.starts_with("\x1b[38;5;255mSubhanAllah\x1b[0m"));
        assert!(line.ends_with("7 of 33  [paused]"));
    }

    #[test]
    fn completed_hint_offers_restart() {
        assert_eq!(command_hint(SessionStatus::Completed), "x: again  q: leave");
        assert!(command_hint(SessionStatus::Running).contains("c: cancel"));
    }
}
