//! Migration patterns
//!
//! Each pattern is a time-parameterized trajectory that yields the point an
//! agent is currently heading for. The set is closed: [`MigrationPattern`]
//! pairs a pattern identifier with its parameter struct and
//! [`evaluate_target`] dispatches on it.
//!
//! Every parameter is optional. Missing values fall back to a default derived
//! from the agent's spawn position (the *anchor*), so evaluation never fails.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3, Vec3Swizzles};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::core::{ConfigError, Span};
use crate::creature::AgentKind;

/// Feeding or migration waypoints
pub type AreaList = SmallVec<[Vec3; 4]>;

// ============================================================================
// Pattern identifiers
// ============================================================================

/// Identifier of a migration pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Circular,
    FigureEight,
    Vertical,
    SeasonalDrift,
    RandomWander,
    FeedingMigration,
    DeepShallowCycle,
    GentleSway,
    DeepCurrent,
    ThermalLayers,
    TidalDrift,
}

impl PatternKind {
    /// Every pattern, in declaration order
    pub const ALL: [PatternKind; 11] = [
        PatternKind::Circular,
        PatternKind::FigureEight,
        PatternKind::Vertical,
        PatternKind::SeasonalDrift,
        PatternKind::RandomWander,
        PatternKind::FeedingMigration,
        PatternKind::DeepShallowCycle,
        PatternKind::GentleSway,
        PatternKind::DeepCurrent,
        PatternKind::ThermalLayers,
        PatternKind::TidalDrift,
    ];

    /// Snake-case name used in config files and logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PatternKind::Circular => "circular",
            PatternKind::FigureEight => "figure_eight",
            PatternKind::Vertical => "vertical",
            PatternKind::SeasonalDrift => "seasonal_drift",
            PatternKind::RandomWander => "random_wander",
            PatternKind::FeedingMigration => "feeding_migration",
            PatternKind::DeepShallowCycle => "deep_shallow_cycle",
            PatternKind::GentleSway => "gentle_sway",
            PatternKind::DeepCurrent => "deep_current",
            PatternKind::ThermalLayers => "thermal_layers",
            PatternKind::TidalDrift => "tidal_drift",
        }
    }

    /// Position in [`PatternKind::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        PatternKind::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownPattern(s.to_string()))
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Orbit around a slowly drifting center
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitParams {
    pub radius: Option<f32>,
    pub center: Option<Vec2>,
    pub base_y: Option<f32>,
    /// Angular speed (radians per second)
    pub speed: Option<f32>,
    /// Amplitude of the seasonal wobble of the center
    pub drift: Option<Vec2>,
    /// Angular frequency of the wobble along x and z
    pub drift_frequency: Option<Vec2>,
}

/// Lissajous figure-eight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureEightParams {
    pub scale: Option<f32>,
    pub center: Option<Vec2>,
    pub base_y: Option<f32>,
    pub speed: Option<f32>,
    pub drift: Option<Vec2>,
}

/// Bobbing in place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalParams {
    pub amplitude: Option<f32>,
    pub center: Option<Vec2>,
    pub base_y: Option<f32>,
    pub speed: Option<f32>,
    /// Amplitude of the slow seasonal depth change
    pub depth_drift: Option<f32>,
    /// Angular frequency of the seasonal depth change
    pub depth_drift_frequency: Option<f32>,
}

/// Wide, slow wandering around a start point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftParams {
    pub start: Option<Vec2>,
    pub base_y: Option<f32>,
    pub speed: Option<f32>,
    pub range: Option<f32>,
}

/// Periodically re-rolled random target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderParams {
    /// Full horizontal width of the re-roll box
    pub range: Option<f32>,
    /// Full height of the re-roll box
    pub vertical_range: Option<f32>,
}

/// Cycling between feeding areas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedingParams {
    pub areas: Option<AreaList>,
    /// Seconds spent at each area
    pub cycle_time: Option<f32>,
    pub orbit_radius: Option<f32>,
    pub orbit_speed: Option<f32>,
}

/// Day/night vertical migration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthCycleParams {
    pub center: Option<Vec2>,
    pub shallow_y: Option<f32>,
    pub deep_y: Option<f32>,
}

/// Gentle two-axis sway on top of a large drift
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayParams {
    pub sway: Option<Vec2>,
    pub base_y: Option<f32>,
    pub speed: Option<f32>,
}

/// Current whose heading rotates seasonally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentParams {
    pub start: Option<Vec2>,
    pub base_y: Option<f32>,
    pub speed: Option<f32>,
    pub range: Option<f32>,
}

/// Following a thermal layer that rises and sinks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    pub center: Option<Vec2>,
    pub preferred_depth: Option<f32>,
    pub amplitude: Option<f32>,
}

/// Back-and-forth tidal sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidalParams {
    pub center: Option<Vec2>,
    pub base_y: Option<f32>,
    pub strength: Option<f32>,
    /// Sweep heading in radians
    pub direction: Option<f32>,
}

/// A migration pattern together with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationPattern {
    Circular(OrbitParams),
    FigureEight(FigureEightParams),
    Vertical(VerticalParams),
    SeasonalDrift(DriftParams),
    RandomWander(WanderParams),
    FeedingMigration(FeedingParams),
    DeepShallowCycle(DepthCycleParams),
    GentleSway(SwayParams),
    DeepCurrent(CurrentParams),
    ThermalLayers(ThermalParams),
    TidalDrift(TidalParams),
}

impl Default for MigrationPattern {
    fn default() -> Self {
        MigrationPattern::RandomWander(WanderParams::default())
    }
}

impl MigrationPattern {
    /// Identifier of this pattern
    #[must_use]
    pub fn kind(&self) -> PatternKind {
        match self {
            MigrationPattern::Circular(_) => PatternKind::Circular,
            MigrationPattern::FigureEight(_) => PatternKind::FigureEight,
            MigrationPattern::Vertical(_) => PatternKind::Vertical,
            MigrationPattern::SeasonalDrift(_) => PatternKind::SeasonalDrift,
            MigrationPattern::RandomWander(_) => PatternKind::RandomWander,
            MigrationPattern::FeedingMigration(_) => PatternKind::FeedingMigration,
            MigrationPattern::DeepShallowCycle(_) => PatternKind::DeepShallowCycle,
            MigrationPattern::GentleSway(_) => PatternKind::GentleSway,
            MigrationPattern::DeepCurrent(_) => PatternKind::DeepCurrent,
            MigrationPattern::ThermalLayers(_) => PatternKind::ThermalLayers,
            MigrationPattern::TidalDrift(_) => PatternKind::TidalDrift,
        }
    }

    /// Pattern with every parameter left to its anchor-derived default
    #[must_use]
    pub fn with_defaults(kind: PatternKind) -> Self {
        match kind {
            PatternKind::Circular => MigrationPattern::Circular(OrbitParams::default()),
            PatternKind::FigureEight => MigrationPattern::FigureEight(FigureEightParams::default()),
            PatternKind::Vertical => MigrationPattern::Vertical(VerticalParams::default()),
            PatternKind::SeasonalDrift => MigrationPattern::SeasonalDrift(DriftParams::default()),
            PatternKind::RandomWander => MigrationPattern::RandomWander(WanderParams::default()),
            PatternKind::FeedingMigration => {
                MigrationPattern::FeedingMigration(FeedingParams::default())
            }
            PatternKind::DeepShallowCycle => {
                MigrationPattern::DeepShallowCycle(DepthCycleParams::default())
            }
            PatternKind::GentleSway => MigrationPattern::GentleSway(SwayParams::default()),
            PatternKind::DeepCurrent => MigrationPattern::DeepCurrent(CurrentParams::default()),
            PatternKind::ThermalLayers => MigrationPattern::ThermalLayers(ThermalParams::default()),
            PatternKind::TidalDrift => MigrationPattern::TidalDrift(TidalParams::default()),
        }
    }

    /// Randomized parameters for a freshly assigned pattern around `anchor`
    pub fn generate<R: Rng + ?Sized>(
        kind: PatternKind,
        anchor: Vec3,
        species: AgentKind,
        rng: &mut R,
    ) -> Self {
        let center = Some(anchor.xz());
        let base_y = Some(anchor.y);
        let jelly = species == AgentKind::Jellyfish;

        match kind {
            PatternKind::Circular => MigrationPattern::Circular(OrbitParams {
                radius: if jelly { pick(rng, 4.0, 12.0) } else { pick(rng, 6.0, 16.0) },
                center,
                base_y,
                speed: if jelly { pick(rng, 0.002, 0.007) } else { pick(rng, 0.004, 0.012) },
                drift: jelly.then_some(Vec2::new(10.0, 8.0)),
                drift_frequency: jelly.then_some(Vec2::new(0.002, 0.0025)),
            }),
            PatternKind::FigureEight => MigrationPattern::FigureEight(FigureEightParams {
                scale: pick(rng, 4.0, 12.0),
                center,
                base_y,
                speed: pick(rng, 0.003, 0.009),
                drift: None,
            }),
            PatternKind::Vertical => MigrationPattern::Vertical(VerticalParams {
                amplitude: pick(rng, 3.0, 7.0),
                center,
                base_y,
                speed: if jelly { pick(rng, 0.003, 0.009) } else { pick(rng, 0.005, 0.013) },
                depth_drift: jelly.then_some(2.0),
                depth_drift_frequency: jelly.then_some(0.003),
            }),
            PatternKind::SeasonalDrift => MigrationPattern::SeasonalDrift(DriftParams {
                start: center,
                base_y,
                speed: pick(rng, 0.002, 0.008),
                range: pick(rng, 10.0, 25.0),
            }),
            PatternKind::RandomWander => MigrationPattern::RandomWander(WanderParams::default()),
            PatternKind::FeedingMigration => {
                let (areas, cycle, orbit_radius, orbit_speed) = if jelly {
                    (
                        smallvec![
                            Vec3::new(20.0, -1.0, 25.0),
                            Vec3::new(-25.0, -3.0, -20.0),
                            Vec3::new(30.0, -2.0, -30.0),
                            Vec3::new(-30.0, -4.0, 22.0),
                        ],
                        pick(rng, 120.0, 240.0),
                        Some(12.0),
                        Some(0.008),
                    )
                } else {
                    (
                        smallvec![
                            Vec3::new(15.0, -2.0, 20.0),
                            Vec3::new(-20.0, -4.0, -15.0),
                            Vec3::new(25.0, -3.0, -25.0),
                            Vec3::new(-30.0, -5.0, 18.0),
                        ],
                        pick(rng, 90.0, 150.0),
                        None,
                        None,
                    )
                };
                MigrationPattern::FeedingMigration(FeedingParams {
                    areas: Some(areas),
                    cycle_time: cycle,
                    orbit_radius,
                    orbit_speed,
                })
            }
            PatternKind::DeepShallowCycle => MigrationPattern::DeepShallowCycle(DepthCycleParams {
                center,
                shallow_y: Some(-1.0),
                deep_y: Some(-8.0),
            }),
            PatternKind::GentleSway => MigrationPattern::GentleSway(SwayParams {
                sway: Some(Vec2::new(
                    Span::new(3.0, 8.0).sample(rng),
                    Span::new(2.0, 6.0).sample(rng),
                )),
                base_y,
                speed: pick(rng, 0.003, 0.007),
            }),
            PatternKind::DeepCurrent => MigrationPattern::DeepCurrent(CurrentParams {
                start: center,
                base_y,
                speed: pick(rng, 0.001, 0.004),
                range: pick(rng, 8.0, 20.0),
            }),
            PatternKind::ThermalLayers => MigrationPattern::ThermalLayers(ThermalParams {
                center,
                preferred_depth: base_y,
                amplitude: pick(rng, 2.0, 5.0),
            }),
            PatternKind::TidalDrift => MigrationPattern::TidalDrift(TidalParams {
                center,
                base_y,
                strength: pick(rng, 15.0, 25.0),
                direction: pick(rng, 0.0, TAU),
            }),
        }
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> Option<f32> {
    Some(Span::new(min, max).sample(rng))
}

// ============================================================================
// Evaluation
// ============================================================================

/// Per-agent inputs to [`evaluate_target`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternContext {
    /// Spawn position; source of every parameter default
    pub anchor: Vec3,
    /// Phase offset desynchronizing agents that share a pattern
    pub phase: f32,
    pub agent_id: u32,
    /// Current wander target, only read by `RandomWander`
    pub wander_target: Vec3,
}

impl PatternContext {
    #[must_use]
    pub fn new(anchor: Vec3, phase: f32, agent_id: u32) -> Self {
        Self {
            anchor,
            phase,
            agent_id,
            wander_target: anchor,
        }
    }
}

/// Where the agent should be heading at `time`
#[must_use]
pub fn evaluate_target(time: f32, pattern: &MigrationPattern, ctx: &PatternContext) -> Vec3 {
    match pattern {
        MigrationPattern::Circular(p) => circular(time, p, ctx),
        MigrationPattern::FigureEight(p) => figure_eight(time, p, ctx),
        MigrationPattern::Vertical(p) => vertical(time, p, ctx),
        MigrationPattern::SeasonalDrift(p) => seasonal_drift(time, p, ctx),
        MigrationPattern::RandomWander(_) => ctx.wander_target,
        MigrationPattern::FeedingMigration(p) => feeding_migration(time, p, ctx),
        MigrationPattern::DeepShallowCycle(p) => deep_shallow_cycle(time, p, ctx),
        MigrationPattern::GentleSway(p) => gentle_sway(time, p, ctx),
        MigrationPattern::DeepCurrent(p) => deep_current(time, p, ctx),
        MigrationPattern::ThermalLayers(p) => thermal_layers(time, p, ctx),
        MigrationPattern::TidalDrift(p) => tidal_drift(time, p, ctx),
    }
}

/// Default waypoints when a feeding pattern has none
#[must_use]
pub fn default_feeding_areas() -> AreaList {
    smallvec![
        Vec3::new(10.0, -2.0, 15.0),
        Vec3::new(-15.0, -4.0, -10.0),
        Vec3::new(20.0, -3.0, -20.0),
        Vec3::new(-25.0, -5.0, 12.0),
    ]
}

/// Index of the feeding area active at `time`
#[must_use]
pub fn active_area_index(time: f32, cycle_time: f32, area_count: usize) -> usize {
    if area_count == 0 {
        return 0;
    }
    let cycle = if cycle_time > 0.0 { cycle_time } else { 120.0 };
    ((time / cycle).floor() as i64).rem_euclid(area_count as i64) as usize
}

fn circular(time: f32, p: &OrbitParams, ctx: &PatternContext) -> Vec3 {
    let radius = p.radius.unwrap_or(12.0);
    let center = p.center.unwrap_or(ctx.anchor.xz());
    let speed = p.speed.unwrap_or(0.008);
    let drift = p.drift.unwrap_or(Vec2::new(8.0, 6.0));
    let frequency = p.drift_frequency.unwrap_or(Vec2::splat(0.005));
    let theta = time * speed + ctx.phase;

    let wobble = Vec2::new((time * frequency.x).sin(), (time * frequency.y).cos()) * drift;
    let orbit = Vec2::new(theta.cos(), theta.sin()) * radius;
    let xz = center + wobble + orbit;
    Vec3::new(xz.x, p.base_y.unwrap_or(ctx.anchor.y), xz.y)
}

fn figure_eight(time: f32, p: &FigureEightParams, ctx: &PatternContext) -> Vec3 {
    let scale = p.scale.unwrap_or(8.0);
    let center = p.center.unwrap_or(ctx.anchor.xz());
    let s = time * p.speed.unwrap_or(0.006) + ctx.phase;
    let drift = p.drift.unwrap_or(Vec2::new(12.0, 10.0));

    let wobble = Vec2::new((time * 0.003).sin(), (time * 0.004).cos()) * drift;
    let lobe = Vec2::new(s.sin() * scale, (s * 2.0).sin() * scale * 0.5);
    let xz = center + wobble + lobe;
    Vec3::new(xz.x, p.base_y.unwrap_or(ctx.anchor.y), xz.y)
}

fn vertical(time: f32, p: &VerticalParams, ctx: &PatternContext) -> Vec3 {
    let center = p.center.unwrap_or(ctx.anchor.xz());
    let base_y = p.base_y.unwrap_or(ctx.anchor.y);
    let amplitude = p.amplitude.unwrap_or(4.0);
    let speed = p.speed.unwrap_or(0.01);
    let seasonal = (time * p.depth_drift_frequency.unwrap_or(0.002)).sin() * p.depth_drift.unwrap_or(3.0);

    let y = base_y + seasonal + (time * speed + ctx.phase).sin() * amplitude;
    Vec3::new(center.x, y, center.y)
}

fn seasonal_drift(time: f32, p: &DriftParams, ctx: &PatternContext) -> Vec3 {
    let start = p.start.unwrap_or(ctx.anchor.xz());
    let speed = p.speed.unwrap_or(0.004);
    let range = p.range.unwrap_or(15.0);

    Vec3::new(
        start.x + (time * 0.001).sin() * 20.0 + (time * speed).sin() * range,
        p.base_y.unwrap_or(ctx.anchor.y),
        start.y + (time * 0.0008).cos() * 18.0 + (time * speed * 0.7).cos() * range * 0.8,
    )
}

fn feeding_migration(time: f32, p: &FeedingParams, ctx: &PatternContext) -> Vec3 {
    let fallback;
    let areas = match &p.areas {
        Some(areas) if !areas.is_empty() => areas,
        _ => {
            fallback = default_feeding_areas();
            &fallback
        }
    };

    let area = areas[active_area_index(time, p.cycle_time.unwrap_or(120.0), areas.len())];
    let radius = p.orbit_radius.unwrap_or(8.0);
    let angle = time * p.orbit_speed.unwrap_or(0.01) + ctx.agent_id as f32;
    area + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}

fn deep_shallow_cycle(time: f32, p: &DepthCycleParams, ctx: &PatternContext) -> Vec3 {
    let center = p.center.unwrap_or(ctx.anchor.xz());
    let shallow = p.shallow_y.unwrap_or(-1.0);
    let deep = p.deep_y.unwrap_or(-7.0);
    let blend = (time * 0.01).sin() * 0.5 + 0.5;
    let drift = time * 0.002;

    Vec3::new(
        center.x + drift.sin() * 15.0,
        shallow + (deep - shallow) * blend,
        center.y + (drift * 0.8).cos() * 12.0,
    )
}

fn gentle_sway(time: f32, p: &SwayParams, ctx: &PatternContext) -> Vec3 {
    let sway = p.sway.unwrap_or(Vec2::new(4.0, 3.0));
    let speed = p.speed.unwrap_or(0.005);

    Vec3::new(
        ctx.anchor.x + (time * 0.001).sin() * 15.0 + (time * speed + ctx.phase).sin() * sway.x,
        p.base_y.unwrap_or(ctx.anchor.y),
        ctx.anchor.z
            + (time * 0.0012).cos() * 12.0
            + (time * speed * 0.7 + ctx.phase).cos() * sway.y,
    )
}

fn deep_current(time: f32, p: &CurrentParams, ctx: &PatternContext) -> Vec3 {
    let start = p.start.unwrap_or(ctx.anchor.xz());
    let speed = p.speed.unwrap_or(0.003);
    let range = p.range.unwrap_or(12.0);
    let heading = (time * 0.0008).sin() * PI;

    Vec3::new(
        start.x + (time * speed + heading).sin() * range,
        p.base_y.unwrap_or(ctx.anchor.y),
        start.y + (time * speed * 0.6 + heading).cos() * range * 0.8,
    )
}

fn thermal_layers(time: f32, p: &ThermalParams, ctx: &PatternContext) -> Vec3 {
    let center = p.center.unwrap_or(ctx.anchor.xz());
    let depth = p.preferred_depth.unwrap_or(ctx.anchor.y);
    let amplitude = p.amplitude.unwrap_or(3.0);
    let drift = time * 0.003;

    Vec3::new(
        center.x + drift.sin() * 18.0,
        depth + (time * 0.005).sin() * amplitude,
        center.y + (drift * 0.8).cos() * 15.0,
    )
}

fn tidal_drift(time: f32, p: &TidalParams, ctx: &PatternContext) -> Vec3 {
    let center = p.center.unwrap_or(ctx.anchor.xz());
    let strength = p.strength.unwrap_or(20.0);
    let direction = p.direction.unwrap_or(0.0);
    let tide = (time * 0.01).sin() * strength;

    Vec3::new(
        center.x + direction.cos() * tide,
        p.base_y.unwrap_or(ctx.anchor.y),
        center.y + direction.sin() * tide,
    )
}

// ============================================================================
// Wander state
// ============================================================================

/// Mutable target of the `RandomWander` pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderState {
    pub target: Vec3,
    /// Seconds until the next re-roll
    pub timer: f32,
}

impl WanderState {
    /// Initial target somewhere in the `extent` box around `anchor`
    pub fn new<R: Rng + ?Sized>(anchor: Vec3, extent: Vec3, initial_timer: Span, rng: &mut R) -> Self {
        Self {
            target: anchor + random_offset(extent, rng),
            timer: initial_timer.sample(rng),
        }
    }

    /// Count down and re-roll around `position` on expiry.
    ///
    /// Returns `true` when a new target was drawn.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        position: Vec3,
        extent: Vec3,
        interval: Span,
        rng: &mut R,
    ) -> bool {
        self.timer -= dt;
        if self.timer > 0.0 {
            return false;
        }
        self.reroll(position, extent, interval, rng);
        true
    }

    /// Draw a fresh target around `position` and restart the timer
    pub fn reroll<R: Rng + ?Sized>(&mut self, position: Vec3, extent: Vec3, interval: Span, rng: &mut R) {
        self.target = position + random_offset(extent, rng);
        self.timer = interval.sample(rng).max(0.0);
    }
}

/// Re-roll box for a wander pattern, falling back to species values
#[must_use]
pub fn wander_extent(params: &WanderParams, fallback_range: f32, fallback_vertical: f32) -> Vec3 {
    let range = params.range.unwrap_or(fallback_range).max(0.0);
    let vertical = params.vertical_range.unwrap_or(fallback_vertical).max(0.0);
    Vec3::new(range, vertical, range)
}

fn random_offset<R: Rng + ?Sized>(extent: Vec3, rng: &mut R) -> Vec3 {
    let half = extent * 0.5;
    Vec3::new(
        Span::new(-half.x, half.x).sample(rng),
        Span::new(-half.y, half.y).sample(rng),
        Span::new(-half.z, half.z).sample(rng),
    )
}

/// Pick a pattern from `pool` uniformly; `RandomWander` if the pool is empty
pub fn choose_pattern<R: Rng + ?Sized>(pool: &[PatternKind], rng: &mut R) -> PatternKind {
    if pool.is_empty() {
        return PatternKind::RandomWander;
    }
    pool[rng.gen_range(0..pool.len())]
}

/// Initial angle offset for a new agent
pub fn random_phase<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    Span::new(0.0, TAU).sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx() -> PatternContext {
        PatternContext::new(Vec3::new(5.0, -4.0, -3.0), 0.7, 3)
    }

    fn close(a: Vec3, b: Vec3, tolerance: f32) -> bool {
        (a - b).length() < tolerance
    }

    #[test]
    fn test_circular_is_periodic_without_drift() {
        let speed = 0.5;
        let pattern = MigrationPattern::Circular(OrbitParams {
            radius: Some(10.0),
            speed: Some(speed),
            drift: Some(Vec2::ZERO),
            ..Default::default()
        });
        let period = TAU / speed;

        for t in [0.0, 3.3, 10.0, 41.0] {
            let a = evaluate_target(t, &pattern, &ctx());
            let b = evaluate_target(t + period, &pattern, &ctx());
            assert!(close(a, b, 1e-3), "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn test_circular_stays_on_radius() {
        let pattern = MigrationPattern::Circular(OrbitParams {
            radius: Some(7.0),
            drift: Some(Vec2::ZERO),
            ..Default::default()
        });
        let c = ctx();
        for t in [0.0, 25.0, 400.0] {
            let target = evaluate_target(t, &pattern, &c);
            let r = (target.xz() - c.anchor.xz()).length();
            assert!((r - 7.0).abs() < 1e-3);
            assert!((target.y - c.anchor.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_defaults_come_from_anchor() {
        let c = ctx();
        let target = evaluate_target(0.0, &MigrationPattern::with_defaults(PatternKind::Vertical), &c);

        assert!((target.x - c.anchor.x).abs() < 1e-6);
        assert!((target.z - c.anchor.z).abs() < 1e-6);
        // base + 4 * sin(phase)
        assert!((target.y - (c.anchor.y + 4.0 * c.phase.sin())).abs() < 1e-4);
    }

    #[test]
    fn test_every_default_pattern_is_finite() {
        let c = ctx();
        for kind in PatternKind::ALL {
            let pattern = MigrationPattern::with_defaults(kind);
            assert_eq!(pattern.kind(), kind);
            for t in [0.0, 1.0, 1234.5, 1.0e5] {
                assert!(evaluate_target(t, &pattern, &c).is_finite(), "{kind} at {t}");
            }
        }
    }

    #[test]
    fn test_random_wander_returns_wander_target() {
        let mut c = ctx();
        c.wander_target = Vec3::new(1.0, 2.0, 3.0);
        let target = evaluate_target(99.0, &MigrationPattern::default(), &c);
        assert_eq!(target, c.wander_target);
    }

    #[test]
    fn test_feeding_cycles_through_areas() {
        let pattern = MigrationPattern::FeedingMigration(FeedingParams {
            areas: Some(smallvec![Vec3::new(10.0, -2.0, 0.0), Vec3::new(-10.0, -5.0, 0.0)]),
            cycle_time: Some(60.0),
            orbit_radius: Some(0.0),
            ..Default::default()
        });
        let c = ctx();

        assert!(close(evaluate_target(10.0, &pattern, &c), Vec3::new(10.0, -2.0, 0.0), 1e-4));
        assert!(close(evaluate_target(70.0, &pattern, &c), Vec3::new(-10.0, -5.0, 0.0), 1e-4));
        assert!(close(evaluate_target(130.0, &pattern, &c), Vec3::new(10.0, -2.0, 0.0), 1e-4));
    }

    #[test]
    fn test_feeding_with_empty_areas_uses_defaults() {
        let pattern = MigrationPattern::FeedingMigration(FeedingParams {
            areas: Some(AreaList::new()),
            cycle_time: Some(0.0),
            orbit_radius: Some(0.0),
            ..Default::default()
        });
        let target = evaluate_target(0.0, &pattern, &ctx());
        assert!(close(target, default_feeding_areas()[0], 1e-4));
    }

    #[test]
    fn test_active_area_index() {
        assert_eq!(active_area_index(0.0, 120.0, 4), 0);
        assert_eq!(active_area_index(250.0, 120.0, 4), 2);
        assert_eq!(active_area_index(600.0, 120.0, 4), 1);
        assert_eq!(active_area_index(-1.0, 120.0, 4), 3);
        assert_eq!(active_area_index(5.0, 120.0, 0), 0);
    }

    #[test]
    fn test_orbit_wobble_frequency() {
        let pattern = MigrationPattern::Circular(OrbitParams {
            radius: Some(0.0),
            drift: Some(Vec2::new(10.0, 8.0)),
            drift_frequency: Some(Vec2::new(0.002, 0.0025)),
            ..Default::default()
        });
        let c = ctx();
        let target = evaluate_target(100.0, &pattern, &c);
        let expected = c.anchor.xz() + Vec2::new(0.2_f32.sin() * 10.0, 0.25_f32.cos() * 8.0);

        assert!((target.xz() - expected).length() < 1e-4);
    }

    #[test]
    fn test_jellyfish_patterns_drift_slower() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let anchor = Vec3::new(3.0, -2.0, 1.0);

        let MigrationPattern::Circular(jelly) =
            MigrationPattern::generate(PatternKind::Circular, anchor, AgentKind::Jellyfish, &mut rng)
        else {
            panic!("expected a circular pattern");
        };
        assert_eq!(jelly.drift_frequency, Some(Vec2::new(0.002, 0.0025)));

        let MigrationPattern::Circular(fish) =
            MigrationPattern::generate(PatternKind::Circular, anchor, AgentKind::Fish, &mut rng)
        else {
            panic!("expected a circular pattern");
        };
        assert_eq!(fish.drift_frequency, None);

        let MigrationPattern::Vertical(vertical) =
            MigrationPattern::generate(PatternKind::Vertical, anchor, AgentKind::Jellyfish, &mut rng)
        else {
            panic!("expected a vertical pattern");
        };
        assert_eq!(vertical.depth_drift, Some(2.0));
        assert_eq!(vertical.depth_drift_frequency, Some(0.003));
    }

    #[test]
    fn test_vertical_depth_drift_frequency() {
        let pattern = MigrationPattern::Vertical(VerticalParams {
            amplitude: Some(0.0),
            depth_drift: Some(2.0),
            depth_drift_frequency: Some(0.003),
            ..Default::default()
        });
        let c = ctx();
        let y = evaluate_target(100.0, &pattern, &c).y;

        assert!((y - (c.anchor.y + 0.3_f32.sin() * 2.0)).abs() < 1e-5);
    }

    #[test]
    fn test_thermal_layers_default_depth_is_anchor() {
        let c = ctx();
        let target = evaluate_target(0.0, &MigrationPattern::with_defaults(PatternKind::ThermalLayers), &c);
        assert!((target.y - c.anchor.y).abs() < 1e-6);
    }

    #[test]
    fn test_deep_shallow_cycle_range() {
        let pattern = MigrationPattern::with_defaults(PatternKind::DeepShallowCycle);
        for i in 0..200 {
            let y = evaluate_target(i as f32 * 17.0, &pattern, &ctx()).y;
            assert!((-7.0..=-1.0).contains(&y));
        }
    }

    #[test]
    fn test_wander_reroll_within_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let extent = Vec3::new(20.0, 8.0, 20.0);
        let mut wander = WanderState::new(Vec3::ZERO, extent, Span::new(1.0, 2.0), &mut rng);
        let position = Vec3::new(12.0, -5.0, 3.0);

        let mut rerolled = false;
        for _ in 0..200 {
            if wander.update(1.0 / 60.0, position, extent, Span::new(8.0, 23.0), &mut rng) {
                rerolled = true;
                break;
            }
        }

        assert!(rerolled);
        let offset = (wander.target - position).abs();
        assert!(offset.x <= 10.0 + 1e-4 && offset.y <= 4.0 + 1e-4 && offset.z <= 10.0 + 1e-4);
        assert!(Span::new(8.0, 23.0).contains(wander.timer));
    }

    #[test]
    fn test_pattern_kind_parse() {
        assert_eq!("circular".parse::<PatternKind>(), Ok(PatternKind::Circular));
        assert_eq!("Figure-Eight".parse::<PatternKind>(), Ok(PatternKind::FigureEight));
        assert_eq!(
            "spiral".parse::<PatternKind>(),
            Err(ConfigError::UnknownPattern("spiral".to_string()))
        );
        for kind in PatternKind::ALL {
            assert_eq!(kind.name().parse::<PatternKind>(), Ok(kind));
            assert_eq!(PatternKind::ALL[kind.index()], kind);
        }
    }

    #[test]
    fn test_generate_matches_kind() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for species in [AgentKind::Fish, AgentKind::Jellyfish] {
            for kind in PatternKind::ALL {
                let pattern = MigrationPattern::generate(kind, Vec3::new(3.0, -2.0, 1.0), species, &mut rng);
                assert_eq!(pattern.kind(), kind);
            }
        }
    }
}
