use std::f64::consts::FRAC_PI_4;

use rand::Rng;

use crate::audio::{AudioOutput, Sound};
use crate::store::ScoreStore;

/// Reference field width; the display scale factor is `width / REF_WIDTH`.
pub const REF_WIDTH: f64 = 800.0;

/// Gameplay constants at reference scale. Distances are pixels on an
/// 800-wide field; per-frame values assume the 60Hz reference frame.
/// All of these are tuning values, not invariants.
#[derive(Clone, Copy, Debug)]
pub struct Tuning {
    pub gravity: f64,
    pub jump_impulse: f64,
    pub max_fall_speed: f64,
    pub rot_factor: f64,
    pub pipe_speed: f64,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub min_piece_height: f64,
    pub spawn_interval_ms: f64,
    pub cull_margin: f64,
    pub bird_x: f64,
    pub bird_size: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.15,
            jump_impulse: -2.5,
            max_fall_speed: 7.0,
            rot_factor: 0.1,
            pipe_speed: 3.0,
            pipe_width: 80.0,
            pipe_gap: 180.0,
            min_piece_height: 100.0,
            spawn_interval_ms: 2500.0,
            cull_margin: 50.0,
            bird_x: 150.0,
            bird_size: 35.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub vy: f64,
    pub rot: f64,
}

/// One pair of pipes sharing an x position, separated by the tuned gap.
/// `passed` flips to true exactly once, when the pair's trailing edge
/// crosses the bird's x, and awards one point.
#[derive(Clone, Copy, Debug)]
pub struct PipePair {
    pub x: f64,
    pub top_height: f64,
    pub passed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct Cloud {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Active,
}

pub struct Game {
    pub(crate) w: f64,
    pub(crate) h: f64,
    pub(crate) scale: f64,
    pub(crate) tuning: Tuning,
    pub(crate) bird: Bird,
    pub(crate) pipes: Vec<PipePair>,
    pub(crate) clouds: Vec<Cloud>,
    mode: Mode,
    score: u32,
    best: u32,
    spawn_ms: f64,
    audio: Box<dyn AudioOutput>,
    store: Box<dyn ScoreStore>,
}

fn clamp_field(w: usize, h: usize) -> (f64, f64) {
    (w.max(1) as f64, h.max(1) as f64)
}

impl Game {
    pub fn new(
        w: usize,
        h: usize,
        audio: Box<dyn AudioOutput>,
        mut store: Box<dyn ScoreStore>,
    ) -> Self {
        let (w, h) = clamp_field(w, h);
        let best = store.load();
        let mut rng = rand::thread_rng();
        let clouds = (0..5)
            .map(|_| Cloud {
                x: rng.gen_range(0.0..w),
                y: rng.gen_range(0.0..(h / 2.0).max(1.0)),
                size: rng.gen_range(20.0..60.0),
                speed: rng.gen_range(0.5..1.0),
            })
            .collect();

        let mut game = Self {
            w,
            h,
            scale: w / REF_WIDTH,
            tuning: Tuning::default(),
            bird: Bird {
                x: 0.0,
                y: 0.0,
                w: 0.0,
                h: 0.0,
                vy: 0.0,
                rot: 0.0,
            },
            pipes: Vec::new(),
            clouds,
            mode: Mode::Idle,
            score: 0,
            best,
            spawn_ms: 0.0,
            audio,
            store,
        };
        game.reset_bird();
        game
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub(crate) fn pipe_width(&self) -> f64 {
        self.tuning.pipe_width * self.scale
    }

    pub(crate) fn pipe_gap(&self) -> f64 {
        self.tuning.pipe_gap * self.scale
    }

    pub(crate) fn pipe_rects(&self, p: &PipePair) -> (Rect, Rect) {
        let w = self.pipe_width();
        let gap_bottom = p.top_height + self.pipe_gap();
        (
            Rect {
                x: p.x,
                y: 0.0,
                w,
                h: p.top_height,
            },
            Rect {
                x: p.x,
                y: gap_bottom,
                w,
                h: (self.h - gap_bottom).max(0.0),
            },
        )
    }

    fn bird_rect(&self) -> Rect {
        Rect {
            x: self.bird.x,
            y: self.bird.y,
            w: self.bird.w,
            h: self.bird.h,
        }
    }

    /// The start/retry control shown by the idle overlay, in pixel coords.
    pub fn start_button(&self) -> Rect {
        let w = (200.0 * self.scale).max(24.0);
        let h = (50.0 * self.scale).max(9.0);
        Rect {
            x: (self.w - w) / 2.0,
            y: (self.h - h) / 2.0,
            w,
            h,
        }
    }

    fn reset_bird(&mut self) {
        let size = self.tuning.bird_size * self.scale;
        self.bird = Bird {
            x: self.tuning.bird_x * self.scale,
            y: (self.h - size) / 2.0,
            w: size,
            h: size,
            vy: 0.0,
            rot: 0.0,
        };
    }

    /// Begin a new session. Only effective while Idle.
    pub fn start(&mut self) {
        if self.mode == Mode::Active {
            return;
        }
        self.reset_bird();
        self.pipes.clear();
        self.score = 0;
        self.spawn_ms = 0.0;
        self.mode = Mode::Active;
        self.audio.play(Sound::Start);
        self.audio.music_start();
    }

    /// Flap. Only effective while Active; assigns the impulse exactly,
    /// regardless of current velocity.
    pub fn jump(&mut self) {
        if self.mode != Mode::Active {
            return;
        }
        self.bird.vy = self.tuning.jump_impulse * self.scale;
        self.bird.rot = -0.5;
        self.audio.play(Sound::Jump);
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        let (w, h) = clamp_field(w, h);
        let ratio_w = w / self.w;
        let ratio_h = h / self.h;
        self.w = w;
        self.h = h;
        self.scale = w / REF_WIDTH;

        let size = self.tuning.bird_size * self.scale;
        self.bird.x = self.tuning.bird_x * self.scale;
        self.bird.w = size;
        self.bird.h = size;
        self.bird.y = (self.bird.y * ratio_h).clamp(0.0, (self.h - size).max(0.0));
        for p in &mut self.pipes {
            p.x *= ratio_w;
            p.top_height *= ratio_h;
        }
        for c in &mut self.clouds {
            c.x *= ratio_w;
            c.y *= ratio_h;
        }
    }

    /// One step of the session. `dt_ms` is wall-clock time since the last
    /// call; integration is normalized to the 60Hz reference frame.
    pub fn advance(&mut self, dt_ms: f64) {
        if self.mode == Mode::Idle {
            return;
        }
        let dt = dt_ms.clamp(0.0, 100.0);
        let dtf = dt / (1000.0 / 60.0);
        let t = self.tuning;
        let s = self.scale;

        let bird = &mut self.bird;
        bird.vy = (bird.vy + t.gravity * s * dtf).min(t.max_fall_speed * s);
        bird.y += bird.vy * dtf;
        bird.rot = (bird.vy / s * t.rot_factor).clamp(-FRAC_PI_4, FRAC_PI_4);

        self.drift_clouds(dtf);

        self.spawn_ms += dt;
        if self.spawn_ms > t.spawn_interval_ms {
            self.spawn_pipe();
            self.spawn_ms = 0.0;
        }

        let pw = self.pipe_width();
        let cull = t.cull_margin * s;
        for p in &mut self.pipes {
            p.x -= t.pipe_speed * s * dtf;
        }
        self.pipes.retain(|p| p.x + pw > -cull);

        if self.bird.y < 0.0 || self.bird.y + self.bird.h > self.h {
            self.end_session();
            return;
        }

        let bird_rect = self.bird_rect();
        let hit = self.pipes.iter().any(|p| {
            let (top, bottom) = self.pipe_rects(p);
            bird_rect.overlaps(&top) || bird_rect.overlaps(&bottom)
        });
        if hit {
            self.end_session();
            return;
        }

        let bird_x = self.bird.x;
        let mut gained = 0;
        for p in &mut self.pipes {
            if !p.passed && p.x + pw < bird_x {
                p.passed = true;
                gained += 1;
            }
        }
        for _ in 0..gained {
            self.score += 1;
            self.audio.play(Sound::Point);
            if self.score > self.best {
                self.best = self.score;
                self.store.save(self.best);
            }
        }
    }

    fn end_session(&mut self) {
        self.mode = Mode::Idle;
        self.audio.play(Sound::Collision);
        self.audio.music_stop();
    }

    fn spawn_pipe(&mut self) {
        let gap = self.pipe_gap();
        let min_h = self.tuning.min_piece_height * self.scale;
        let max_h = self.h - gap - min_h;
        let top_height = if max_h > min_h {
            rand::thread_rng().gen_range(min_h..max_h)
        } else {
            // Field too small for the tuned gap.
            min_h.min((self.h / 3.0).max(1.0))
        };
        self.pipes.push(PipePair {
            x: self.w,
            top_height,
            passed: false,
        });
    }

    fn drift_clouds(&mut self, dtf: f64) {
        let mut rng = rand::thread_rng();
        for c in &mut self.clouds {
            c.x -= c.speed * self.scale * dtf;
            if c.x + c.size * self.scale < 0.0 {
                c.x = self.w + c.size * self.scale;
                c.y = rng.gen_range(0.0..(self.h / 2.0).max(1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use std::cell::Cell;
    use std::rc::Rc;

    const FRAME: f64 = 1000.0 / 60.0;

    struct SharedStore(Rc<Cell<u32>>);

    impl ScoreStore for SharedStore {
        fn load(&mut self) -> u32 {
            self.0.get()
        }

        fn save(&mut self, value: u32) {
            self.0.set(value);
        }
    }

    fn game_with_store(stored: Rc<Cell<u32>>) -> Game {
        Game::new(800, 600, Box::new(NullAudio), Box::new(SharedStore(stored)))
    }

    fn game() -> Game {
        game_with_store(Rc::new(Cell::new(0)))
    }

    /// A pair already behind the bird, eligible for scoring on the next step.
    fn passed_pipe(g: &Game) -> PipePair {
        PipePair {
            x: g.bird.x - g.pipe_width() - 1.0,
            top_height: 100.0,
            passed: false,
        }
    }

    #[test]
    fn idle_advance_changes_nothing() {
        let mut g = game();
        g.pipes.push(PipePair {
            x: 400.0,
            top_height: 150.0,
            passed: false,
        });
        let (y, vy, score, spawn_ms) = (g.bird.y, g.bird.vy, g.score, g.spawn_ms);
        for _ in 0..100 {
            g.advance(FRAME);
        }
        assert_eq!(g.mode(), Mode::Idle);
        assert_eq!(g.bird.y, y);
        assert_eq!(g.bird.vy, vy);
        assert_eq!(g.score, score);
        assert_eq!(g.spawn_ms, spawn_ms);
        assert_eq!(g.pipes.len(), 1);
        assert_eq!(g.pipes[0].x, 400.0);
    }

    #[test]
    fn starting_resets_the_session() {
        let mut g = game();
        g.start();
        assert_eq!(g.mode(), Mode::Active);
        assert_eq!(g.score(), 0);
        assert!(g.pipes.is_empty());
        assert_eq!(g.spawn_ms, 0.0);
        assert_eq!(g.bird.vy, 0.0);

        // Crash, then start again.
        g.pipes.push(passed_pipe(&g));
        g.advance(1.0);
        assert_eq!(g.score(), 1);
        g.bird.y = -1.0;
        g.advance(FRAME);
        assert_eq!(g.mode(), Mode::Idle);
        g.start();
        assert_eq!(g.mode(), Mode::Active);
        assert_eq!(g.score(), 0);
        assert!(g.pipes.is_empty());
    }

    #[test]
    fn start_is_a_noop_while_active() {
        let mut g = game();
        g.start();
        g.pipes.push(passed_pipe(&g));
        g.advance(1.0);
        assert_eq!(g.score(), 1);
        g.start();
        assert_eq!(g.score(), 1);
        assert_eq!(g.pipes.len(), 1);
    }

    #[test]
    fn fall_speed_is_capped() {
        let mut g = game();
        g.start();
        let cap = g.tuning.max_fall_speed * g.scale;
        for _ in 0..50 {
            g.advance(FRAME);
            assert!(g.bird.vy <= cap);
            if g.mode() == Mode::Idle {
                return; // hit the floor, cap held the whole way down
            }
        }
    }

    #[test]
    fn jump_assigns_the_impulse_exactly() {
        let mut g = game();
        g.start();
        for _ in 0..10 {
            g.advance(FRAME);
        }
        g.jump();
        assert_eq!(g.bird.vy, g.tuning.jump_impulse * g.scale);
    }

    #[test]
    fn jump_is_ignored_while_idle() {
        let mut g = game();
        let vy = g.bird.vy;
        g.jump();
        assert_eq!(g.bird.vy, vy);
        assert_eq!(g.mode(), Mode::Idle);
    }

    #[test]
    fn spawned_top_height_stays_within_bounds() {
        // fieldHeight=600, gap=180, minHeight=100: top height in [100, 320].
        let mut g = game();
        for _ in 0..500 {
            g.spawn_pipe();
        }
        for p in &g.pipes {
            assert!(p.top_height >= 100.0 && p.top_height <= 320.0);
        }
    }

    #[test]
    fn pipes_spawn_on_the_interval() {
        let mut g = game();
        g.start();
        g.tuning.gravity = 0.0; // hold the bird in place
        g.tuning.pipe_speed = 0.0; // and the pipes too
        let mut elapsed = 0.0;
        while elapsed <= 2500.0 {
            g.advance(100.0);
            elapsed += 100.0;
        }
        assert_eq!(g.pipes.len(), 1);
        assert_eq!(g.pipes[0].x, g.w);
        while elapsed <= 5200.0 {
            g.advance(100.0);
            elapsed += 100.0;
        }
        assert_eq!(g.pipes.len(), 2);
    }

    #[test]
    fn stale_pipes_are_culled() {
        let mut g = game();
        g.start();
        g.pipes.push(PipePair {
            x: -200.0,
            top_height: 150.0,
            passed: true,
        });
        g.advance(1.0);
        assert!(g.pipes.is_empty());
    }

    #[test]
    fn each_pair_scores_exactly_once() {
        let mut g = game();
        g.start();
        g.pipes.push(passed_pipe(&g));
        g.advance(1.0);
        assert_eq!(g.score(), 1);
        assert!(g.pipes[0].passed);
        for _ in 0..20 {
            g.advance(1.0);
        }
        assert_eq!(g.score(), 1);
    }

    #[test]
    fn pipe_overlap_ends_the_session() {
        let mut g = game();
        g.start();
        // Top piece tall enough to cover the bird's row.
        g.pipes.push(PipePair {
            x: g.bird.x,
            top_height: g.h,
            passed: false,
        });
        g.advance(FRAME);
        assert_eq!(g.mode(), Mode::Idle);
    }

    #[test]
    fn leaving_the_field_ends_the_session() {
        let mut g = game();
        g.start();
        g.bird.y = -1.0;
        g.advance(FRAME);
        assert_eq!(g.mode(), Mode::Idle);

        let mut g = game();
        g.start();
        g.bird.y = g.h;
        g.advance(FRAME);
        assert_eq!(g.mode(), Mode::Idle);
    }

    #[test]
    fn high_score_is_seeded_monotone_and_persisted() {
        let stored = Rc::new(Cell::new(3));
        let mut g = game_with_store(stored.clone());
        assert_eq!(g.best(), 3);

        g.start();
        g.pipes.push(passed_pipe(&g));
        g.advance(1.0);
        assert_eq!(g.score(), 1);
        assert_eq!(g.best(), 3); // one point does not beat the stored best
        assert_eq!(stored.get(), 3);

        for _ in 0..4 {
            g.pipes.clear();
            g.pipes.push(passed_pipe(&g));
            g.advance(1.0);
        }
        assert_eq!(g.score(), 5);
        assert_eq!(g.best(), 5);
        assert_eq!(stored.get(), 5);

        // A worse follow-up session leaves the best untouched.
        g.bird.y = -1.0;
        g.advance(FRAME);
        g.start();
        g.pipes.push(passed_pipe(&g));
        g.advance(1.0);
        assert_eq!(g.score(), 1);
        assert_eq!(g.best(), 5);
        assert_eq!(stored.get(), 5);
    }

    #[test]
    fn degenerate_resize_clamps() {
        let mut g = game();
        g.start();
        g.resize(0, 0);
        assert!(g.w >= 1.0 && g.h >= 1.0);
        g.advance(FRAME);
        g.resize(120, 80);
        assert!(g.bird.y >= 0.0);
    }

    #[test]
    fn rotation_stays_clamped() {
        let mut g = game();
        g.start();
        for _ in 0..100 {
            g.advance(FRAME);
            assert!(g.bird.rot.abs() <= FRAC_PI_4 + 1e-9);
            if g.mode() == Mode::Idle {
                break;
            }
        }
    }
}
