//! Surface appearance: land map, day/night, clouds and the rim glow.

use ratatui::style::Color;

pub const EARTH_MAP_WIDTH: usize = 64;
pub const EARTH_MAP_HEIGHT: usize = 32;

/// Equirectangular land mask, longitude -180..180 left to right, north at top.
pub const EARTH_MAP: [&str; EARTH_MAP_HEIGHT] = [
    "                                                                ",
    "                                                                ",
    "        #############                                           ",
    "       #################                                        ",
    "     ######################          ##############             ",
    "    #########################      ##################           ",
    "   ###########################    #####################         ",
    "  #############################  ########################       ",
    "  #############################  ########################       ",
    "   ###########################    #######################       ",
    "    ####  ###################     #######################       ",
    "    ###    #################      ########################      ",
    "            ###############       ########################      ",
    "              ############        #######################       ",
    "              ###########         #######################       ",
    "               #########          #######################       ",
    "               ########            #####################        ",
    "               #######             ###################          ",
    "                ######             ###################          ",
    "                #####               ##################          ",
    "                 ####               #################           ",
    "                                     ###############            ",
    "                                     ##############             ",
    "                                      ############              ",
    "                                        ########                ",
    "                                         #####                  ",
    "                                          ###                   ",
    "                                           #             ####   ",
    "                                                        ######  ",
    "                                                         ####   ",
    "                                                                ",
    "                                                                ",
];

// Day side land
const LAND_DAY: (f64, f64, f64) = (70.0, 160.0, 60.0);
// Night side land: warm city lights
const CITY_LIGHTS: (f64, f64, f64) = (255.0, 190.0, 90.0);
const CITY_LIGHTS_LEVEL: f64 = 0.35;
// Day side ocean
const OCEAN_DAY: (f64, f64, f64) = (20.0, 80.0, 200.0);
// Night side ocean
const OCEAN_NIGHT: (f64, f64, f64) = (4.0, 8.0, 30.0);
const CLOUD: (f64, f64, f64) = (235.0, 240.0, 255.0);
const CLOUD_OPACITY: f64 = 0.8;
pub const GLOW: (f64, f64, f64) = (0.0, 136.0, 255.0);

const FRESNEL_BIAS: f64 = 0.1;
const FRESNEL_SCALE: f64 = 1.0;
const FRESNEL_POWER: f64 = 4.0;

/// Everything the shader needs for one surface cell.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub is_land: bool,
    /// Lambertian term, negative on the night side.
    pub intensity: f64,
    /// Cloud cover in [0, 1].
    pub cloud: f64,
    /// Cosine between the surface normal and the direction to the eye.
    pub facing: f64,
}

fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Land mask lookup at a geographic coordinate (degrees).
pub fn is_land(latitude: f64, longitude: f64) -> bool {
    let u = (wrap_lon(longitude) + 180.0) / 360.0;
    let v = (90.0 - latitude.clamp(-90.0, 90.0)) / 180.0;
    let x = ((u * EARTH_MAP_WIDTH as f64) as usize).min(EARTH_MAP_WIDTH - 1);
    let y = ((v * EARTH_MAP_HEIGHT as f64) as usize).min(EARTH_MAP_HEIGHT - 1);
    EARTH_MAP[y].as_bytes()[x] == b'#'
}

/// Procedural cloud cover: storm bands that thin out towards the poles.
pub fn cloud_cover(latitude: f64, longitude: f64) -> f64 {
    let lat = latitude.to_radians();
    let lon = wrap_lon(longitude).to_radians();
    let bands = (lon * 3.0 + (lat * 5.0).sin() * 2.0).sin() * (lat * 4.0 + lon * 2.0).cos();
    let polar_fade = lat.cos();
    ((bands - 0.35) / 0.65).clamp(0.0, 1.0) * polar_fade
}

/// Rim glow strength for a surface facing the eye at `facing` (cosine).
pub fn fresnel(facing: f64) -> f64 {
    (FRESNEL_BIAS + FRESNEL_SCALE * (1.0 - facing.clamp(0.0, 1.0)).powf(FRESNEL_POWER))
        .clamp(0.0, 1.0)
}

fn mix(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

fn scale(c: (f64, f64, f64), k: f64) -> (f64, f64, f64) {
    (c.0 * k, c.1 * k, c.2 * k)
}

fn to_color(c: (f64, f64, f64)) -> Color {
    Color::Rgb(
        c.0.clamp(0.0, 255.0) as u8,
        c.1.clamp(0.0, 255.0) as u8,
        c.2.clamp(0.0, 255.0) as u8,
    )
}

/// Map a surface sample to a glyph and colour.
pub fn shade(sample: SurfaceSample) -> (char, Color) {
    let day = sample.intensity > 0.0;
    // Ambient + diffuse on the day side.
    let light = if day { 0.2 + sample.intensity * 0.8 } else { 0.15 };

    let mut rgb = match (sample.is_land, day) {
        (true, true) => scale(LAND_DAY, light),
        (true, false) => {
            let dark = (-sample.intensity).clamp(0.0, 1.0);
            scale(CITY_LIGHTS, CITY_LIGHTS_LEVEL * (0.4 + 0.6 * dark))
        }
        (false, true) => scale(OCEAN_DAY, light),
        (false, false) => OCEAN_NIGHT,
    };

    let cloud = sample.cloud * CLOUD_OPACITY;
    if cloud > 0.0 {
        rgb = mix(rgb, scale(CLOUD, light), cloud);
    }
    rgb = mix(rgb, GLOW, fresnel(sample.facing) * 0.6);

    let glyph = if cloud > 0.5 {
        '░'
    } else if sample.is_land {
        '⣿'
    } else if !day {
        ' '
    } else if light > 0.8 {
        '~'
    } else if light > 0.5 {
        '-'
    } else {
        '.'
    };
    (glyph, to_color(rgb))
}

/// Halo colour for rays that graze the planet without hitting it.
/// `gap` is the miss distance relative to the planet radius, in [0, 1].
pub fn halo(gap: f64) -> Color {
    to_color(scale(GLOW, (1.0 - gap.clamp(0.0, 1.0)) * 0.7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_land_and_sea() {
        // Central Asia and the middle of the Pacific.
        assert!(is_land(50.0, 80.0));
        assert!(!is_land(0.0, -150.0));
    }

    #[test]
    fn longitude_wraps() {
        assert_eq!(is_land(50.0, 80.0), is_land(50.0, 80.0 + 720.0));
        assert_eq!(is_land(-20.0, -60.0), is_land(-20.0, 300.0));
    }

    #[test]
    fn fresnel_peaks_at_the_limb() {
        assert!((fresnel(1.0) - 0.1).abs() < 1e-12);
        assert!((fresnel(0.0) - 1.0).abs() < 1e-12);
        assert!(fresnel(0.3) > fresnel(0.8));
    }

    #[test]
    fn clouds_stay_in_range() {
        for lat in (-90..=90).step_by(15) {
            for lon in (-180..=180).step_by(20) {
                let c = cloud_cover(lat as f64, lon as f64);
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }

    #[test]
    fn night_ocean_is_blank() {
        let (glyph, _) = shade(SurfaceSample {
            is_land: false,
            intensity: -0.5,
            cloud: 0.0,
            facing: 1.0,
        });
        assert_eq!(glyph, ' ');
    }
}
