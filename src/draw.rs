use std::f64::consts::FRAC_PI_4;

use crate::game::{Game, Mode, Rect};
use crate::pixels::{Rgb, Surface, draw_number, draw_text};

pub(crate) const SKY_TOP: Rgb = Rgb(0x87, 0xCE, 0xEB);
const SKY_BOT: Rgb = Rgb(0x73, 0xC2, 0xFB);
const CLOUD: Rgb = Rgb(255, 255, 255);
const PIPE_LIGHT: Rgb = Rgb(0x2E, 0xCC, 0x71);
const PIPE_DARK: Rgb = Rgb(0x27, 0xAE, 0x60);
const PIPE_EDGE: Rgb = Rgb(0x22, 0x99, 0x54);
const BIRD_BODY: Rgb = Rgb(0xFF, 0xD7, 0x00);
const BIRD_WING: Rgb = Rgb(0xFF, 0xA5, 0x00);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(0, 0, 0);
const BUTTON: Rgb = Rgb(0xE7, 0x4C, 0x3C);
const BUTTON_EDGE: Rgb = Rgb(0xC0, 0x39, 0x2B);
const TEXT: Rgb = Rgb(255, 255, 255);

impl Game {
    /// Draw the whole scene, back to front. Pure: no game state changes.
    pub fn render(&self, fb: &mut Surface) {
        self.draw_sky(fb);
        self.draw_clouds(fb);
        self.draw_pipes(fb);
        self.draw_bird(fb);
        self.draw_hud(fb);
        if self.mode() == Mode::Idle {
            self.draw_overlay(fb);
        }
    }

    fn draw_sky(&self, fb: &mut Surface) {
        let h = fb.height().max(1);
        for y in 0..h {
            let c = Rgb::lerp(SKY_TOP, SKY_BOT, y as f64 / h as f64);
            for x in 0..fb.width() {
                fb.set(x as i32, y as i32, c);
            }
        }
    }

    fn draw_clouds(&self, fb: &mut Surface) {
        for c in &self.clouds {
            let r = (c.size * self.scale) as i32;
            fb.fill_circle(c.x as i32, c.y as i32, r.max(1), CLOUD);
        }
    }

    fn draw_pipes(&self, fb: &mut Surface) {
        for pipe in &self.pipes {
            let (top, bottom) = self.pipe_rects(pipe);
            draw_pipe_piece(fb, &top);
            draw_pipe_piece(fb, &bottom);
        }
    }

    fn draw_bird(&self, fb: &mut Surface) {
        let b = &self.bird;
        let cx = (b.x + b.w / 2.0) as i32;
        let cy = (b.y + b.h / 2.0) as i32;
        let rx = ((b.w / 2.0) as i32).max(1);
        let ry = ((b.h / 2.0) as i32).max(1);

        // Rotation about the center, approximated by tilting the features:
        // positive rotation (diving) drops the leading edge.
        let tilt = (b.rot / FRAC_PI_4 * ry as f64 * 0.8) as i32;

        fb.fill_ellipse(cx, cy, rx, ry, BIRD_BODY);
        fb.fill_ellipse(cx - rx / 3, cy - tilt / 2, rx / 2, (ry / 2).max(1), BIRD_WING);

        let eye_x = cx + rx / 2;
        let eye_y = cy - ry / 2 + tilt;
        let eye_r = (ry / 3).max(1);
        fb.fill_circle(eye_x, eye_y, eye_r, BIRD_EYE);
        fb.fill_circle(eye_x, eye_y, (eye_r / 2).max(1), BIRD_PUPIL);
    }

    fn draw_hud(&self, fb: &mut Surface) {
        let w = fb.width() as i32;
        draw_number(fb, w / 2, 3, self.score(), TEXT);
        draw_text(fb, w - 18, 3, "HI", TEXT);
        draw_number(fb, w - 8, 3, self.best(), BIRD_BODY);
    }

    fn draw_overlay(&self, fb: &mut Surface) {
        fb.dim();

        let b = self.start_button();
        let (x, y) = (b.x as i32, b.y as i32);
        let (w, h) = ((b.w as i32).max(1), (b.h as i32).max(1));
        fb.fill_rect(x, y, w, h, BUTTON);
        fb.stroke_rect(x, y, w, h, BUTTON_EDGE);

        let label = if self.score() > 0 { "RETRY" } else { "START" };
        draw_text(fb, x + w / 2, y + h / 2 - 2, label, TEXT);
    }
}

fn draw_pipe_piece(fb: &mut Surface, r: &Rect) {
    let x0 = r.x as i32;
    let y0 = r.y as i32;
    let w = r.w as i32;
    let h = r.h as i32;
    if w <= 0 || h <= 0 {
        return;
    }
    for dx in 0..w {
        let c = Rgb::lerp(PIPE_LIGHT, PIPE_DARK, dx as f64 / w.max(2) as f64);
        for dy in 0..h {
            fb.set(x0 + dx, y0 + dy, c);
        }
    }
    fb.stroke_rect(x0, y0, w, h, PIPE_EDGE);
}
