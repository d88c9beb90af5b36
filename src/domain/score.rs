/// Per-attempt statistics: elapsed time, mask uses and the star rating.

use crate::config::ScoringConfig;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ScoreStats {
    pub elapsed_time: f32,
    pub mask_uses: u32,
    pub completed: bool,
    pub final_time: f32,
    pub final_mask_uses: u32,
    pub stars: u32,
}

/// Everything the win panel shows.
#[derive(Clone, PartialEq, Debug)]
pub struct ScoreSummary {
    pub time: String,
    pub mask_uses: u32,
    pub stars: String,
    pub rating: &'static str,
    pub time_thresholds: Vec<String>,
    pub mask_threshold: u32,
}

#[derive(Clone, Debug)]
pub struct ScoreSystem {
    pub elapsed_time: f32,
    pub mask_uses: u32,
    pub completed: bool,
    pub final_time: f32,
    pub final_mask_uses: u32,
    pub stars: u32,
    /// Seconds; each one exceeded costs a star.
    pub time_thresholds: Vec<f32>,
    pub mask_threshold: u32,
}

impl ScoreSystem {
    pub fn new(config: &ScoringConfig) -> Self {
        ScoreSystem {
            elapsed_time: 0.0,
            mask_uses: 0,
            completed: false,
            final_time: 0.0,
            final_mask_uses: 0,
            stars: 0,
            time_thresholds: config.time_thresholds.clone(),
            mask_threshold: config.mask_threshold,
        }
    }

    /// The clock stops once the level is completed.
    pub fn update(&mut self, dt: f32) {
        if !self.completed {
            self.elapsed_time += dt;
        }
    }

    pub fn add_mask_use(&mut self) {
        self.mask_uses += 1;
    }

    pub fn complete_level(&mut self) {
        self.completed = true;
        self.final_time = self.elapsed_time;
        self.final_mask_uses = self.mask_uses;
        self.stars = self.calculate_stars();
    }

    pub fn calculate_stars(&self) -> u32 {
        if !self.completed {
            return 0;
        }
        let exceeded = self.time_thresholds.iter().filter(|&&t| self.final_time > t).count() as i32;
        let mut stars = (3 - exceeded).max(0);
        if self.final_mask_uses > self.mask_threshold {
            stars -= 1;
        }
        stars.clamp(0, 3) as u32
    }

    pub fn reset(&mut self) {
        self.elapsed_time = 0.0;
        self.mask_uses = 0;
        self.completed = false;
        self.final_time = 0.0;
        self.final_mask_uses = 0;
        self.stars = 0;
    }

    pub fn set_config(&mut self, time_thresholds: Option<&[f32]>, mask_threshold: Option<u32>) {
        if let Some(t) = time_thresholds {
            self.time_thresholds = t.to_vec();
        }
        if let Some(m) = mask_threshold {
            self.mask_threshold = m;
        }
    }

    pub fn current_stats(&self) -> ScoreStats {
        ScoreStats {
            elapsed_time: self.elapsed_time,
            mask_uses: self.mask_uses,
            completed: self.completed,
            final_time: self.final_time,
            final_mask_uses: self.final_mask_uses,
            stars: self.stars,
        }
    }

    /// `MM:SS`; `None` formats the running clock. Minutes are not capped at 59.
    pub fn time_formatted(&self, seconds: Option<f32>) -> String {
        format_time(seconds.unwrap_or(self.elapsed_time))
    }

    pub fn star_display(&self, stars: Option<u32>) -> String {
        let n = stars.unwrap_or(self.stars).min(3) as usize;
        format!("{}{}", "★".repeat(n), "☆".repeat(3 - n))
    }

    pub fn performance_rating(&self) -> &'static str {
        match self.stars {
            3 => "Perfect!",
            2 => "Good!",
            1 => "OK",
            _ => "Try again!",
        }
    }

    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            time: self.time_formatted(Some(self.final_time)),
            mask_uses: self.final_mask_uses,
            stars: self.star_display(None),
            rating: self.performance_rating(),
            time_thresholds: self.time_thresholds.iter().map(|&t| format_time(t)).collect(),
            mask_threshold: self.mask_threshold,
        }
    }
}

pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
