//! Frame compositing.
//!
//! [`SceneRenderer::render`] is a pure function of the scene: it redraws
//! the whole frame from scratch into a buffer it owns and reuses, so the
//! same scene state always yields the same pixels.

use arena_core::agent::Agent;
use arena_core::math::ArenaBounds;
use arena_core::scene::Scene;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::avatar::{placeholder_avatar, AvatarCache};
use crate::canvas::{hex, Canvas, Rgb};

/// Width of an agent's health bar.
pub const HEALTH_BAR_WIDTH: f32 = 36.0;
/// Height of an agent's health bar.
pub const HEALTH_BAR_HEIGHT: f32 = 5.0;
/// Gap between the top of the avatar circle and its health bar.
pub const HEALTH_BAR_GAP: f32 = 4.0;
/// Opacity of the red overlay on dead agents.
pub const DEAD_TINT_ALPHA: f32 = 0.5;

/// Colours and sidebar metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderLayout {
    /// Arena floor.
    pub floor: Rgb,
    /// Sidebar background.
    pub sidebar: Rgb,
    /// Divider between sidebar and floor.
    pub divider: Rgb,
    /// Blood decals.
    pub blood: Rgb,
    /// Missing health.
    pub health_back: Rgb,
    /// Remaining health.
    pub health_fill: Rgb,
    /// Overlay on dead avatars.
    pub dead_tint: Rgb,
    /// Tallest a sidebar row may be.
    pub sidebar_row_height: f32,
    /// Inner margin of the sidebar.
    pub sidebar_padding: f32,
}

impl Default for RenderLayout {
    fn default() -> Self {
        Self {
            floor: hex(0xC2_B2_80),
            sidebar: hex(0x20_22_2A),
            divider: hex(0x0E_0F_13),
            blood: hex(0x8A_03_03),
            health_back: hex(0xA0_00_02),
            health_fill: hex(0x00_CC_0D),
            dead_tint: hex(0xFF_00_00),
            sidebar_row_height: 24.0,
            sidebar_padding: 8.0,
        }
    }
}

/// Draws scenes into a reused RGBA frame.
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    bounds: ArenaBounds,
    layout: RenderLayout,
    canvas: Canvas,
    avatars: AvatarCache,
}

impl SceneRenderer {
    /// Renderer for a surface matching `bounds`, with no avatars loaded.
    #[must_use]
    pub fn new(bounds: ArenaBounds, layout: RenderLayout) -> Self {
        let width = bounds.width.max(1.0).round() as u32;
        let height = bounds.height.max(1.0).round() as u32;
        Self {
            bounds,
            layout,
            canvas: Canvas::new(width, height),
            avatars: AvatarCache::default(),
        }
    }

    /// Use pre-loaded avatars.
    #[must_use]
    pub fn with_avatars(mut self, avatars: AvatarCache) -> Self {
        self.avatars = avatars;
        self
    }

    /// Replace the avatar cache.
    pub fn set_avatars(&mut self, avatars: AvatarCache) {
        self.avatars = avatars;
    }

    /// Frame dimensions in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    /// Active layout.
    #[must_use]
    pub const fn layout(&self) -> &RenderLayout {
        &self.layout
    }

    /// Composite one frame: background, decals (oldest first), agents in
    /// registration order, health bars, then the sidebar roster.
    pub fn render(&mut self, scene: &Scene) -> &RgbaImage {
        self.draw_background();
        self.draw_decals(scene);
        for agent in scene.agents() {
            self.draw_agent(agent);
        }
        for agent in scene.agents() {
            self.draw_health_bar(agent);
        }
        self.draw_sidebar(scene);
        self.canvas.image()
    }

    /// The last frame rendered.
    #[must_use]
    pub const fn frame(&self) -> &RgbaImage {
        self.canvas.image()
    }

    fn draw_background(&mut self) {
        self.canvas.fill(self.layout.floor);
        let sidebar = self.bounds.sidebar_width;
        if sidebar > 0.0 {
            self.canvas
                .fill_rect(0.0, 0.0, sidebar, self.bounds.height, self.layout.sidebar, 1.0);
            self.canvas
                .fill_rect(sidebar - 2.0, 0.0, 2.0, self.bounds.height, self.layout.divider, 1.0);
        }
    }

    fn draw_decals(&mut self, scene: &Scene) {
        let lifetime = scene.decal_lifetime();
        for decal in scene.decals() {
            self.canvas.fill_circle(
                decal.position.x,
                decal.position.y,
                decal.size / 2.0,
                self.layout.blood,
                decal.opacity(lifetime),
            );
        }
    }

    fn draw_agent(&mut self, agent: &Agent) {
        let radius = agent.radius();
        let position = agent.position;
        match self.avatars.get(agent.id) {
            Some(avatar) => self.canvas.blit_circle(avatar, position.x, position.y, radius),
            None => {
                let fallback = placeholder_avatar(agent.class, (radius * 2.0).round() as u32);
                self.canvas.blit_circle(&fallback, position.x, position.y, radius);
            }
        }
        if agent.is_dead() {
            self.canvas
                .fill_circle(position.x, position.y, radius, self.layout.dead_tint, DEAD_TINT_ALPHA);
        }
    }

    fn draw_health_bar(&mut self, agent: &Agent) {
        let x = agent.position.x - HEALTH_BAR_WIDTH / 2.0;
        let y = agent.position.y - HEALTH_BAR_GAP - agent.radius() - HEALTH_BAR_HEIGHT;
        self.canvas
            .fill_rect(x, y, HEALTH_BAR_WIDTH, HEALTH_BAR_HEIGHT, self.layout.health_back, 1.0);
        self.canvas.fill_rect(
            x,
            y,
            HEALTH_BAR_WIDTH * agent.health_fraction(),
            HEALTH_BAR_HEIGHT,
            self.layout.health_fill,
            1.0,
        );
    }

    /// One row per agent: avatar thumbnail and a health bar.
    fn draw_sidebar(&mut self, scene: &Scene) {
        let agents = scene.agents();
        let pad = self.layout.sidebar_padding;
        let usable_width = self.bounds.sidebar_width - pad * 2.0;
        if agents.is_empty() || usable_width <= 0.0 {
            return;
        }
        let usable_height = self.bounds.height - pad * 2.0;
        let row = (usable_height / agents.len() as f32).min(self.layout.sidebar_row_height);
        if row < 4.0 {
            return;
        }

        let thumb_radius = (row / 2.0 - 2.0).max(1.0);
        let bar_x = pad + row + 4.0;
        let bar_width = (usable_width - row - 4.0).max(0.0);
        let bar_height = (row / 3.0).max(2.0);

        for (index, agent) in agents.iter().enumerate() {
            let top = pad + row * index as f32;
            let cx = pad + row / 2.0;
            let cy = top + row / 2.0;
            match self.avatars.get(agent.id) {
                Some(avatar) => self.canvas.blit_circle(avatar, cx, cy, thumb_radius),
                None => self
                    .canvas
                    .fill_circle(cx, cy, thumb_radius, agent.class.color(), 1.0),
            }
            if agent.is_dead() {
                self.canvas
                    .fill_circle(cx, cy, thumb_radius, self.layout.dead_tint, DEAD_TINT_ALPHA);
            }

            let bar_y = cy - bar_height / 2.0;
            self.canvas
                .fill_rect(bar_x, bar_y, bar_width, bar_height, self.layout.health_back, 1.0);
            self.canvas.fill_rect(
                bar_x,
                bar_y,
                bar_width * agent.health_fraction(),
                bar_height,
                self.layout.health_fill,
                1.0,
            );
        }
    }
}
