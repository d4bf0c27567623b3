//! Pure helpers used by the audio thread: queue stepping and fade curves.

use std::time::Duration;

use super::types::LoopMode;

/// Where the queue cursor should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Play the entry at this queue position.
    To(usize),
    /// Reached the end with nothing to wrap to.
    End,
}

/// Compute the next queue position.
///
/// `pos` is `None` when nothing from the queue is loaded. Manual steps honor
/// `LoopAll` wrapping but never repeat the current track; automatic steps
/// (track ended) repeat it under `LoopOne`.
pub(crate) fn step(
    pos: Option<usize>,
    len: usize,
    loop_mode: LoopMode,
    forward: bool,
    manual: bool,
) -> Step {
    if len == 0 {
        return Step::End;
    }
    let Some(pos) = pos.filter(|&p| p < len) else {
        return Step::To(if forward { 0 } else { len - 1 });
    };
    if !manual && loop_mode == LoopMode::LoopOne {
        return Step::To(pos);
    }

    if forward {
        if pos + 1 < len {
            Step::To(pos + 1)
        } else if loop_mode == LoopMode::LoopAll {
            Step::To(0)
        } else {
            Step::End
        }
    } else if pos > 0 {
        Step::To(pos - 1)
    } else if loop_mode == LoopMode::LoopAll {
        Step::To(len - 1)
    } else {
        Step::End
    }
}

/// Volume levels for a linear fade from `from` to `to`, ending exactly on `to`.
pub(crate) fn fade_levels(from: f32, to: f32, steps: u64) -> Vec<f32> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|s| {
            let t = s as f32 / steps as f32;
            from + (to - from) * t
        })
        .collect()
}

/// Sleep between fade steps, never zero.
pub(crate) fn fade_step_delay(total_ms: u64, steps: u64) -> Duration {
    Duration::from_millis((total_ms / steps.max(1)).max(1))
}

/// Map a 0-100 volume onto rodio's gain.
pub(crate) fn gain(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 100.0
}

/// Offset `elapsed` by `secs`, clamped at zero and (when known) the track end.
pub(crate) fn seek_target(elapsed: Duration, secs: i32, total: Option<Duration>) -> Duration {
    let cur = elapsed.as_secs() as i64;
    let target = Duration::from_secs((cur + i64::from(secs)).max(0) as u64);
    match total {
        Some(t) if target > t => t,
        _ => target,
    }
}
