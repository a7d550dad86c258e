//! Wind, temperature, solar radiation and rainfall
//!
//! Reads: elevation, mesh positions. Writes: `r_wind`, `r_temperature`,
//! `r_moisture`, `r_rainfall` (and the triangle moisture mirror).
//!
//! The wind field is a three-cell approximation (trades, westerlies, polar
//! easterlies) locally deflected by terrain. Rainfall is moisture transport
//! along that field with orographic shedding; ocean regions are an
//! infinite moisture source, lakes and rivers evaporate at the configured
//! rate. Rivers only exist after the first flux pass, so the pipeline
//! marks them and runs rainfall a second time.

use glam::DVec2;
use std::f64::consts::PI;
use tracing::debug;

use crate::base::{BaseWorld, MAX_ALTITUDE_M, NO_REGION};
use crate::config::{ClimateOptions, MoistureTransfer, RainfallVariant, TransportOrder, WindMode};
use crate::geometry::lon_difference;

/// Coldest annual mean, at the poles at sea level
pub const TEMP_MIN_C: f64 = -34.0;
/// Warmest annual mean, at the equator at sea level
pub const TEMP_MAX_C: f64 = 31.0;
/// Dry adiabatic lapse, °C per meter of altitude
pub const LAPSE_C_PER_M: f64 = 0.0098;

/// Solar constant, MJ m⁻² min⁻¹ (FAO-56)
const SOLAR_GSC: f64 = 0.0820;
/// Angstrom coefficients for a clear sky (FAO-56 defaults)
const ANGSTROM_AS: f64 = 0.25;
const ANGSTROM_BS: f64 = 0.50;

/// Seasonal swing between longest and shortest day, °C
const SEASONAL_SWING_C: f64 = 18.0;
/// Day/night spread around the daily mean, °C
const DIURNAL_SWING_C: f64 = 8.0;

/// How strongly altitude or temperature gradients bend the global wind
const DEFLECTION: f64 = 1.2;

/// Mean annual temperature in °C at a latitude and altitude
///
/// `sin(90° − |φ|)` scales between the polar and equatorial means, then
/// the lapse rate subtracts for altitude.
pub fn annual_temperature(lat_deg: f64, altitude_m: f64) -> f64 {
    let spread = (90.0 - lat_deg.abs()).to_radians().sin();
    spread * (TEMP_MAX_C - TEMP_MIN_C) + TEMP_MIN_C - LAPSE_C_PER_M * altitude_m.max(0.0)
}

/// Solar declination in radians for a day of the year (FAO-56 eq. 24)
pub fn solar_declination(day_of_year: u32) -> f64 {
    0.409 * (2.0 * PI / 365.0 * day_of_year as f64 - 1.39).sin()
}

/// Inverse relative Earth–Sun distance (FAO-56 eq. 23)
pub fn inverse_sun_distance(day_of_year: u32) -> f64 {
    1.0 + 0.033 * (2.0 * PI / 365.0 * day_of_year as f64).cos()
}

/// Sunset hour angle in radians (FAO-56 eq. 25)
///
/// Clamped for polar day and night, where `−tanφ·tanδ` leaves [−1, 1].
pub fn sunset_hour_angle(lat_deg: f64, day_of_year: u32) -> f64 {
    let phi = lat_deg.to_radians();
    let delta = solar_declination(day_of_year);
    (-phi.tan() * delta.tan()).clamp(-1.0, 1.0).acos()
}

/// Hours of daylight at a latitude and day of year (FAO-56 eq. 34)
pub fn day_length_hours(lat_deg: f64, day_of_year: u32) -> f64 {
    24.0 / PI * sunset_hour_angle(lat_deg, day_of_year)
}

/// Extraterrestrial radiation in MJ m⁻² day⁻¹ (FAO-56 eq. 21)
pub fn extraterrestrial_radiation(lat_deg: f64, day_of_year: u32) -> f64 {
    let phi = lat_deg.to_radians();
    let delta = solar_declination(day_of_year);
    let dr = inverse_sun_distance(day_of_year);
    let ws = sunset_hour_angle(lat_deg, day_of_year);
    24.0 * 60.0 / PI
        * SOLAR_GSC
        * dr
        * (ws * phi.sin() * delta.sin() + phi.cos() * delta.cos() * ws.sin())
}

/// Clear-sky solar radiation at the surface in MJ m⁻² day⁻¹
///
/// Angstrom formula at full sunshine, reduced by the sun's angular
/// distance from the local zenith.
pub fn solar_radiation(lat_deg: f64, day_of_year: u32) -> f64 {
    let ra = extraterrestrial_radiation(lat_deg, day_of_year);
    let delta = solar_declination(day_of_year);
    let offset = (lat_deg.to_radians() - delta).abs().min(PI / 2.0);
    (ANGSTROM_AS + ANGSTROM_BS) * ra * (1.0 - offset.sin())
}

/// Daily (min, max) temperature in °C for a day of the year
///
/// The seasonal term follows day length around the annual mean; the
/// diurnal spread is a fixed band around the daily mean.
pub fn daily_temperature(lat_deg: f64, altitude_m: f64, day_of_year: u32) -> (f64, f64) {
    let mean = annual_temperature(lat_deg, altitude_m);
    let season = (day_length_hours(lat_deg, day_of_year) - 12.0) / 12.0 * SEASONAL_SWING_C;
    let t = mean + season;
    (t - 0.5 * DIURNAL_SWING_C, t + 0.5 * DIURNAL_SWING_C)
}

/// Prevailing wind of the three-cell model at a latitude
///
/// Returns a (zonal, meridional) vector in (lon, lat) degrees space with
/// east and north positive. Band transitions are blended over 5° so the
/// field has no discontinuities.
pub fn global_wind(lat_deg: f64) -> DVec2 {
    // Hemisphere frame: y positive toward the pole.
    fn cell(abs_lat: f64) -> DVec2 {
        if abs_lat < 30.0 {
            DVec2::new(-0.866, -0.5) // trade easterlies, equatorward
        } else if abs_lat < 60.0 {
            DVec2::new(0.866, 0.5) // westerlies, poleward
        } else {
            DVec2::new(-0.866, -0.5) // polar easterlies
        }
    }

    const BLEND: f64 = 5.0;
    let a = lat_deg.abs().min(90.0);
    let mut v = cell(a);
    for boundary in [30.0, 60.0] {
        let d = a - boundary;
        if d.abs() < BLEND {
            let t = d / (2.0 * BLEND) + 0.5;
            v = cell(boundary - BLEND).lerp(cell(boundary + BLEND), t);
        }
    }
    // The meridional part fades out at the equator (doldrums), which also
    // keeps the field continuous across the hemisphere flip below.
    v.y *= (a / BLEND).min(1.0);
    // Convert poleward back to northward.
    if lat_deg < 0.0 {
        v.y = -v.y;
    }
    v
}

impl BaseWorld {
    /// Altitude of a region in meters (0 for submerged regions)
    #[inline]
    pub(crate) fn altitude_m(&self, r: u32) -> f64 {
        self.r_elevation[r as usize].max(0.0) * MAX_ALTITUDE_M
    }

    /// Direction from region `a` to region `b` in (lon, lat) space
    ///
    /// Longitude wraps the ±180° seam and is scaled by cos(lat) so a
    /// degree east means the same ground distance as a degree north.
    fn latlon_direction(&self, a: u32, b: u32) -> DVec2 {
        let (lat_a, lon_a) = self.mesh.latlon(a);
        let (lat_b, lon_b) = self.mesh.latlon(b);
        let mid = 0.5 * (lat_a + lat_b);
        let d = DVec2::new(
            lon_difference(lon_a, lon_b) * mid.to_radians().cos(),
            lat_b - lat_a,
        );
        d.normalize_or_zero()
    }

    /// Annual mean temperature per region
    pub(crate) fn assign_temperature(&mut self) {
        for r in 0..self.mesh.num_regions() as u32 {
            let (lat, _) = self.mesh.latlon(r);
            self.r_temperature[r as usize] = annual_temperature(lat, self.altitude_m(r));
        }
    }

    /// Local wind field: global three-cell wind deflected by terrain
    pub(crate) fn assign_wind(&mut self, opts: &ClimateOptions) {
        let num = self.mesh.num_regions() as u32;
        for r in 0..num {
            let (lat, _) = self.mesh.latlon(r);
            let base = global_wind(lat);

            let mut push = DVec2::ZERO;
            for nb in self.mesh.neighbors(r) {
                let dir = self.latlon_direction(r, nb);
                let gradient = match opts.wind_mode {
                    // Higher ground ahead pushes the wind away from it.
                    WindMode::Altitude => {
                        (self.r_elevation[nb as usize].max(0.0)
                            - self.r_elevation[r as usize].max(0.0))
                            * -1.0
                    }
                    // Warm ground ahead draws the wind in.
                    WindMode::Thermal => {
                        (self.r_temperature[nb as usize] - self.r_temperature[r as usize])
                            / (TEMP_MAX_C - TEMP_MIN_C)
                    }
                };
                push += dir * gradient;
            }
            self.r_wind[r as usize] = base + push * DEFLECTION;
        }

        for _ in 0..opts.wind_smoothing {
            let old = self.r_wind.clone();
            for r in 0..num {
                let mut sum = old[r as usize];
                let mut count = 1.0;
                for nb in self.mesh.neighbors(r) {
                    sum += old[nb as usize];
                    count += 1.0;
                }
                self.r_wind[r as usize] = sum / count;
            }
        }
    }

    /// Moisture saturation of a region used as a transport source
    ///
    /// Ocean is an infinite source; pooled lakes and marked rivers
    /// evaporate at the configured rate. Land contributes whatever
    /// moisture it holds.
    fn source_moisture(&self, r: u32, opts: &ClimateOptions) -> f64 {
        if self.r_elevation[r as usize] < 0.0 {
            1.0
        } else if self.r_waterpool[r as usize] > 0.0 || self.r_river_evap[r as usize] {
            opts.evaporation
        } else {
            self.r_moisture[r as usize]
        }
    }

    /// Flag riverine land as moisture sources for the next rainfall pass
    ///
    /// Needs the flux field, so the pipeline calls this between the first
    /// flux accumulation and the rainfall re-pass.
    pub(crate) fn mark_river_evaporation(&mut self) {
        for r in 0..self.mesh.num_regions() as u32 {
            self.r_river_evap[r as usize] = !self.is_water(r) && self.is_riverine(r);
        }
    }

    /// Region traversal order for a transport sweep
    fn transport_order(&self, order: TransportOrder) -> Vec<u32> {
        let num = self.mesh.num_regions() as u32;
        let mut regions: Vec<u32> = (0..num).collect();
        match order {
            TransportOrder::Wind => {
                // Up-wind regions first: sort by position projected onto
                // the local wind.
                let key = |r: u32| -> f64 {
                    let (lat, lon) = self.mesh.latlon(r);
                    let w = self.r_wind[r as usize];
                    lon * w.x + lat * w.y
                };
                regions.sort_by(|&p, &q| key(p).total_cmp(&key(q)));
            }
            TransportOrder::CoastDistance => {
                let water: Vec<u32> = (0..num)
                    .filter(|&r| self.r_elevation[r as usize] < 0.0)
                    .collect();
                let dist = self.distance_field(&water, |_| false, false, None);
                regions.sort_by(|&p, &q| dist[p as usize].total_cmp(&dist[q as usize]));
            }
        }
        regions
    }

    /// Rainfall and moisture via the configured transport model
    pub(crate) fn assign_rainfall(&mut self, opts: &ClimateOptions) {
        let num = self.mesh.num_regions() as u32;
        for r in 0..num {
            self.r_moisture[r as usize] = self.source_moisture(r, opts);
            self.r_rainfall[r as usize] = 0.0;
        }

        match opts.variant {
            RainfallVariant::Basic => {
                let order = self.transport_order(TransportOrder::Wind);
                for _ in 0..opts.rain_iterations.max(1) {
                    self.pull_moisture_sweep(&order, opts);
                }
            }
            RainfallVariant::Advanced { transfer, order } => {
                let order = self.transport_order(order);
                for _ in 0..opts.rain_iterations.max(1) {
                    match transfer {
                        MoistureTransfer::Indirect => self.pull_moisture_sweep(&order, opts),
                        MoistureTransfer::Direct => self.push_moisture_sweep(&order, opts),
                    }
                }
            }
        }

        self.smooth_rainfall_downhill();
        self.t_moisture = self.interpolate_to_triangles(&self.r_moisture);

        let total: f64 = self.r_rainfall.iter().sum();
        debug!(total_rainfall = total, "rainfall assigned");
    }

    /// One pull-based transport sweep (the basic model)
    ///
    /// Each land region pulls moisture from its up-wind neighbors, then
    /// sheds the part its altitude cannot hold as rainfall.
    fn pull_moisture_sweep(&mut self, order: &[u32], opts: &ClimateOptions) {
        for &r in order {
            if self.r_elevation[r as usize] < 0.0 {
                continue; // ocean stays saturated
            }
            let mut pulled = 0.0;
            let mut weight = 0.0;
            for nb in self.mesh.neighbors(r) {
                let w = self.r_wind[nb as usize].dot(self.latlon_direction(nb, r)).max(0.0);
                pulled += w * self.source_moisture(nb, opts);
                weight += w;
            }
            let incoming = if weight > 0.0 {
                opts.raininess * pulled / weight
            } else {
                0.0
            };
            let humidity = self.r_moisture[r as usize].max(incoming);
            self.r_moisture[r as usize] = self.shed_orographic(r, humidity, opts);
        }
    }

    /// One push-based transport sweep (the advanced "direct" model)
    fn push_moisture_sweep(&mut self, order: &[u32], opts: &ClimateOptions) {
        for &r in order {
            let available = self.source_moisture(r, opts);
            if available <= 0.0 {
                continue;
            }
            let wind = self.r_wind[r as usize];
            let targets: Vec<(u32, f64)> = self
                .mesh
                .neighbors(r)
                .into_iter()
                .filter(|&nb| self.r_elevation[nb as usize] >= 0.0)
                .map(|nb| (nb, wind.dot(self.latlon_direction(r, nb)).max(0.0)))
                .collect();
            let weight: f64 = targets.iter().map(|&(_, w)| w).sum();
            if weight <= 0.0 {
                continue;
            }
            for (nb, w) in targets {
                let share = opts.raininess * available * w / weight;
                let humidity = self.r_moisture[nb as usize] + share;
                self.r_moisture[nb as usize] = self.shed_orographic(nb, humidity, opts);
            }
        }
    }

    /// Orographic shedding: drop the humidity a region's altitude cannot
    /// hold and return what remains airborne.
    fn shed_orographic(&mut self, r: u32, humidity: f64, opts: &ClimateOptions) -> f64 {
        let ceiling = 1.0 - self.r_elevation[r as usize].max(0.0);
        if humidity > ceiling {
            let shed = opts.rain_shadow * (humidity - ceiling);
            self.r_rainfall[r as usize] += shed;
            humidity - shed
        } else {
            humidity
        }
    }

    /// Average each region's rainfall with its downhill neighbor
    ///
    /// A contraction: the rainfall spread never grows. Sinks keep their
    /// value.
    fn smooth_rainfall_downhill(&mut self) {
        self.assign_downhill(false);
        let old = self.r_rainfall.clone();
        for r in 0..self.mesh.num_regions() {
            let dh = self.r_downhill[r];
            if dh != NO_REGION {
                self.r_rainfall[r] = 0.5 * (old[r] + old[dh as usize]);
            }
        }
    }
}
