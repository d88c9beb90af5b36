/// Sprite-sheet frame sequencer.
///
/// An `Animation` picks a subset of frames out of a `rows × cols` sheet and
/// steps through them at a fixed rate, forward or reversed, looping or
/// play-once. It knows nothing about pixels or glyphs: the renderer resolves
/// `sheet_frame()` against the asset cache.

#[derive(Clone, Debug)]
pub struct Animation {
    /// Asset id of the sheet this clip reads from.
    pub sheet: &'static str,
    frames: Vec<usize>,
    frame_duration: f32,
    looping: bool,
    current: usize,
    timer: f32,
    playing: bool,
    reverse: bool,
    completed: bool,
}

impl Animation {
    /// `frame_indices = None` uses the whole sheet in order. Indices are read
    /// until the first one that falls outside the sheet.
    pub fn new(
        sheet: &'static str,
        rows: usize,
        cols: usize,
        frame_indices: Option<Vec<usize>>,
        frame_duration: f32,
        looping: bool,
    ) -> Self {
        let total = rows * cols;
        let frames: Vec<usize> = match frame_indices {
            Some(indices) => indices.into_iter().take_while(|&i| i < total).collect(),
            None => (0..total).collect(),
        };
        Animation {
            sheet,
            frames,
            frame_duration,
            looping,
            current: 0,
            timer: 0.0,
            playing: false,
            reverse: false,
            completed: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.playing || self.frames.is_empty() {
            return;
        }

        self.timer += dt;
        if self.timer < self.frame_duration {
            return;
        }
        self.timer = 0.0;

        let last = self.frames.len() - 1;
        if self.reverse {
            if self.current == 0 {
                if self.looping {
                    self.current = last;
                } else {
                    self.finish();
                }
            } else {
                self.current -= 1;
            }
        } else if self.current >= last {
            if self.looping {
                self.current = 0;
            } else {
                self.current = last;
                self.finish();
            }
        } else {
            self.current += 1;
        }
    }

    pub fn play(&mut self, reverse: bool) {
        self.playing = true;
        self.reverse = reverse;
        self.completed = false;
        self.current = if reverse { self.frames.len().saturating_sub(1) } else { 0 };
        self.timer = 0.0;
    }

    /// Stop and rewind to the first frame.
    pub fn stop(&mut self) {
        self.playing = false;
        self.current = 0;
        self.timer = 0.0;
        self.completed = false;
        self.reverse = false;
    }

    fn finish(&mut self) {
        self.playing = false;
        self.completed = true;
    }

    /// Index into the clip (0..num_frames).
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Index into the underlying sheet.
    pub fn sheet_frame(&self) -> Option<usize> {
        self.frames.get(self.current_frame()).copied()
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn total_duration(&self) -> f32 {
        self.frame_duration * self.frames.len() as f32
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Only ever true for play-once clips that reached their end.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(n: usize, looping: bool) -> Animation {
        Animation::new("test", 1, n, None, 0.1, looping)
    }

    fn tick(anim: &mut Animation, steps: usize) {
        for _ in 0..steps {
            anim.update(0.1);
        }
    }

    #[test]
    fn not_playing_until_play() {
        let mut a = clip(4, true);
        tick(&mut a, 3);
        assert_eq!(a.current_frame(), 0);
        assert!(!a.is_playing());
    }

    #[test]
    fn looping_wraps_around() {
        let mut a = clip(3, true);
        a.play(false);
        tick(&mut a, 3);
        assert_eq!(a.current_frame(), 0);
        assert!(a.is_playing());
        assert!(!a.is_completed());
    }

    #[test]
    fn play_once_clamps_and_completes() {
        let mut a = clip(3, false);
        a.play(false);
        tick(&mut a, 2);
        assert_eq!(a.current_frame(), 2);
        assert!(!a.is_completed());
        tick(&mut a, 1);
        assert_eq!(a.current_frame(), 2);
        assert!(a.is_completed());
        assert!(!a.is_playing());
    }

    #[test]
    fn reverse_starts_at_end_and_completes_at_zero() {
        let mut a = clip(3, false);
        a.play(true);
        assert_eq!(a.current_frame(), 2);
        tick(&mut a, 2);
        assert_eq!(a.current_frame(), 0);
        tick(&mut a, 1);
        assert!(a.is_completed());
        assert_eq!(a.current_frame(), 0);
    }

    #[test]
    fn replay_clears_completion() {
        let mut a = clip(2, false);
        a.play(false);
        tick(&mut a, 2);
        assert!(a.is_completed());
        a.play(false);
        assert!(!a.is_completed());
        assert_eq!(a.current_frame(), 0);
    }

    #[test]
    fn frame_indices_truncate_at_sheet_bounds() {
        let a = Animation::new("test", 2, 2, Some(vec![0, 3, 4, 1]), 0.1, true);
        assert_eq!(a.num_frames(), 2);
        let mut b = a.clone();
        b.play(false);
        b.update(0.1);
        assert_eq!(b.sheet_frame(), Some(3));
    }

    #[test]
    fn short_updates_accumulate() {
        let mut a = clip(4, true);
        a.play(false);
        a.update(0.05);
        assert_eq!(a.current_frame(), 0);
        a.update(0.05);
        assert_eq!(a.current_frame(), 1);
    }

    #[test]
    fn empty_clip_is_inert() {
        let mut a = Animation::new("test", 0, 0, None, 0.1, false);
        a.play(true);
        a.update(1.0);
        assert_eq!(a.sheet_frame(), None);
        assert!(!a.is_completed());
    }
}
