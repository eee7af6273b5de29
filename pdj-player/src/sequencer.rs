//! Playlist sequencer
//!
//! Ordered collection of clips plus a cursor for the currently selected
//! entry. Insertion order is playback order. Navigation wraps in both
//! directions with exact modular arithmetic: `Next` from the last index
//! lands on 0, `Previous` from 0 lands on the last index.

use crate::clip::ClipSpec;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Navigation direction for [`PlaylistSequencer::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    fn delta(self) -> i64 {
        match self {
            Direction::Next => 1,
            Direction::Previous => -1,
        }
    }
}

/// Ordered clip sequence with a selection cursor.
///
/// The cursor is `None` when nothing is selected; every mutation keeps it
/// either `None` or a valid index.
#[derive(Debug, Clone, Default)]
pub struct PlaylistSequencer {
    clips: Vec<ClipSpec>,
    current: Option<usize>,
}

impl PlaylistSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clips in the sequence
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Currently selected index, if any
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Currently selected clip, if any
    pub fn current(&self) -> Option<&ClipSpec> {
        self.current.and_then(|i| self.clips.get(i))
    }

    /// Clip at a specific index
    pub fn get(&self, index: usize) -> Option<&ClipSpec> {
        self.clips.get(index)
    }

    /// Iterate clips in playback order
    pub fn iter(&self) -> impl Iterator<Item = &ClipSpec> {
        self.clips.iter()
    }

    /// Append a clip to the end of the sequence
    pub fn append(&mut self, clip: ClipSpec) {
        self.clips.push(clip);
    }

    /// Remove the clip at `index`, shifting subsequent entries down.
    ///
    /// The cursor follows the clip it pointed at: a removal below it
    /// decrements it, and removing the selected entry clamps the cursor to
    /// the new last index (or clears it when the sequence empties).
    pub fn remove_at(&mut self, index: usize) -> Result<ClipSpec> {
        if index >= self.clips.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.clips.len(),
            });
        }

        let removed = self.clips.remove(index);

        self.current = match self.current {
            None => None,
            Some(_) if self.clips.is_empty() => None,
            Some(cur) if index < cur => Some(cur - 1),
            Some(cur) if index == cur => Some(cur.min(self.clips.len() - 1)),
            Some(cur) => Some(cur),
        };

        Ok(removed)
    }

    /// Replace the clip at `index` with a new one (re-edit commits a new
    /// immutable clip; the old one is discarded)
    pub fn replace_at(&mut self, index: usize, clip: ClipSpec) -> Result<()> {
        if index >= self.clips.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.clips.len(),
            });
        }
        self.clips[index] = clip;
        Ok(())
    }

    /// Select a specific index
    pub fn select(&mut self, index: usize) -> Result<&ClipSpec> {
        if index >= self.clips.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.clips.len(),
            });
        }
        self.current = Some(index);
        Ok(&self.clips[index])
    }

    /// Move the cursor one step in `direction` with wraparound, returning
    /// the newly selected clip. No-op returning `None` on an empty
    /// sequence.
    ///
    /// The unselected cursor participates in the arithmetic as -1, so
    /// `Next` from "nothing selected" lands on index 0.
    pub fn advance(&mut self, direction: Direction) -> Option<&ClipSpec> {
        if self.clips.is_empty() {
            return None;
        }

        let len = self.clips.len() as i64;
        let cur = self.current.map(|i| i as i64).unwrap_or(-1);
        let next = (cur + direction.delta() + len).rem_euclid(len) as usize;

        self.current = Some(next);
        self.clips.get(next)
    }

    /// Clear the selection without touching the sequence
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Remove every clip and clear the selection
    pub fn clear(&mut self) {
        self.clips.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(tag: &str) -> ClipSpec {
        ClipSpec::new(format!("asset:{}", tag), 0.0, 10.0, 0.0, 0.0).unwrap()
    }

    fn three_clip_sequencer() -> PlaylistSequencer {
        let mut seq = PlaylistSequencer::new();
        seq.append(clip("a"));
        seq.append(clip("b"));
        seq.append(clip("c"));
        seq
    }

    #[test]
    fn test_empty_sequence_advance_is_noop() {
        let mut seq = PlaylistSequencer::new();
        assert!(seq.advance(Direction::Next).is_none());
        assert!(seq.advance(Direction::Previous).is_none());
        assert_eq!(seq.current_index(), None);
    }

    #[test]
    fn test_advance_from_unselected_selects_first() {
        let mut seq = three_clip_sequencer();
        let clip = seq.advance(Direction::Next).unwrap();
        assert_eq!(clip.asset_ref(), "asset:a");
        assert_eq!(seq.current_index(), Some(0));
    }

    #[test]
    fn test_wraparound_next_from_last() {
        let mut seq = three_clip_sequencer();
        seq.select(2).unwrap();
        seq.advance(Direction::Next);
        assert_eq!(seq.current_index(), Some(0));
    }

    #[test]
    fn test_wraparound_previous_from_first() {
        let mut seq = three_clip_sequencer();
        seq.select(0).unwrap();
        seq.advance(Direction::Previous);
        assert_eq!(seq.current_index(), Some(2));
    }

    #[test]
    fn test_cyclic_property_full_pass_returns_to_start() {
        // advancing Next exactly len times returns to the original index
        for start in 0..3 {
            let mut seq = three_clip_sequencer();
            seq.select(start).unwrap();
            for _ in 0..seq.len() {
                seq.advance(Direction::Next);
            }
            assert_eq!(seq.current_index(), Some(start));
        }
    }

    #[test]
    fn test_previous_inverts_next() {
        for start in 0..3 {
            let mut seq = three_clip_sequencer();
            seq.select(start).unwrap();
            seq.advance(Direction::Next);
            seq.advance(Direction::Previous);
            assert_eq!(seq.current_index(), Some(start));
        }
    }

    #[test]
    fn test_remove_selected_last_clamps_cursor() {
        // [A,B,C] with C selected: removing index 2 leaves [A,B], cursor 1
        let mut seq = three_clip_sequencer();
        seq.select(2).unwrap();

        seq.remove_at(2).unwrap();

        assert_eq!(seq.len(), 2);
        assert_eq!(seq.current_index(), Some(1));
        assert_eq!(seq.current().unwrap().asset_ref(), "asset:b");
    }

    #[test]
    fn test_remove_before_cursor_decrements() {
        let mut seq = three_clip_sequencer();
        seq.select(2).unwrap();

        seq.remove_at(0).unwrap();

        // Cursor still points at the same clip (C)
        assert_eq!(seq.current_index(), Some(1));
        assert_eq!(seq.current().unwrap().asset_ref(), "asset:c");
    }

    #[test]
    fn test_remove_after_cursor_leaves_it_alone() {
        let mut seq = three_clip_sequencer();
        seq.select(0).unwrap();

        seq.remove_at(2).unwrap();

        assert_eq!(seq.current_index(), Some(0));
    }

    #[test]
    fn test_remove_last_clip_clears_cursor() {
        let mut seq = PlaylistSequencer::new();
        seq.append(clip("a"));
        seq.select(0).unwrap();

        seq.remove_at(0).unwrap();

        assert!(seq.is_empty());
        assert_eq!(seq.current_index(), None);
        assert!(seq.current().is_none());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut seq = three_clip_sequencer();
        let err = seq.remove_at(3).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_replace_at() {
        let mut seq = three_clip_sequencer();
        seq.replace_at(1, clip("b2")).unwrap();
        assert_eq!(seq.get(1).unwrap().asset_ref(), "asset:b2");
        assert!(seq.replace_at(5, clip("x")).is_err());
    }

    #[test]
    fn test_reset_clears_selection_only() {
        let mut seq = three_clip_sequencer();
        seq.select(1).unwrap();
        seq.reset();
        assert_eq!(seq.current_index(), None);
        assert_eq!(seq.len(), 3);
    }
}
