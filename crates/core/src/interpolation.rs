//! Gap filling for landmark sequences.
//!
//! Frames where the estimator found no body are reconstructed from their
//! neighbours: leading and trailing gaps hold the nearest valid frame,
//! internal gaps are linearly interpolated landmark-by-landmark.

use crate::landmark::{Landmark, LandmarkSequence};

/// Return a copy of `seq` with every absent frame filled in.
///
/// If no frame is valid the sequence is returned unchanged. Frame indices
/// and timestamps are preserved; only `landmarks` is rewritten.
pub fn interpolate_missing(seq: &LandmarkSequence) -> LandmarkSequence {
    let mut out = seq.clone();
    let valid: Vec<usize> = seq
        .frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_valid())
        .map(|(i, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
        return out;
    };

    let first_set = seq.frames[first].landmarks.clone();
    for frame in &mut out.frames[..first] {
        frame.landmarks = first_set.clone();
    }

    for pair in valid.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        if j - i <= 1 {
            continue;
        }
        let (Some(from), Some(to)) = (
            seq.frames[i].landmarks.as_deref(),
            seq.frames[j].landmarks.as_deref(),
        ) else {
            continue;
        };
        let span = (j - i) as f64;
        for k in (i + 1)..j {
            let weight = (k - i) as f64 / span;
            out.frames[k].landmarks = Some(blend(from, to, weight));
        }
    }

    let last_set = seq.frames[last].landmarks.clone();
    for frame in &mut out.frames[last + 1..] {
        frame.landmarks = last_set.clone();
    }

    out
}

/// Blend two landmark sets position-by-position over their common prefix.
fn blend(from: &[Landmark], to: &[Landmark], weight: f64) -> Vec<Landmark> {
    from.iter()
        .zip(to.iter())
        .map(|(a, b)| a.lerp(b, weight))
        .collect()
}
