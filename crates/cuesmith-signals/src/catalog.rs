//! The standard waveform catalog.
//!
//! Fragments are the C helpers emitted into generated sketches; evaluators
//! are pure Rust renditions of the same curves, used only by tests. Both map
//! a normalized phase in [0,1] to an output fraction in [0,1].

use std::f32::consts::PI;

use crate::registry::Registry;

impl Registry {
    /// Build the full standard catalog. Called once at startup; the result
    /// is never mutated.
    pub fn standard() -> Self {
        let mut reg = Self::new();

        reg.register(&["RANDOM", "NOISE"], &[], "randomSignal", RANDOM_SIGNAL, None);
        reg.register(&["BOX", "SQUARE"], &[], "squareWave", SQUARE_WAVE, Some(square));
        reg.register(
            &["TRIANGLE", "EASEINOUT"],
            &[],
            "triangleWave",
            TRIANGLE_WAVE,
            Some(triangle),
        );
        reg.register(&["EASEIN"], &[], "easeIn", EASE_IN, Some(ease_in));
        reg.register(&["EASEOUT"], &[], "easeOut", EASE_OUT, Some(ease_out));
        reg.register(&["EASEINSINE"], &[], "easeInSine", EASE_IN_SINE, Some(ease_in_sine));
        reg.register(
            &["EASEOUTSINE"],
            &[],
            "easeOutSine",
            EASE_OUT_SINE,
            Some(ease_out_sine),
        );
        reg.register(
            &["EASEINOUTSINE", "PULSE"],
            &[],
            "easeInOutSine",
            EASE_IN_OUT_SINE,
            Some(ease_in_out_sine),
        );
        reg.register(&["EASEINEXPO"], &[], "easeInExpo", EASE_IN_EXPO, Some(ease_in_expo));
        reg.register(
            &["EASEOUTEXPO"],
            &[],
            "easeOutExpo",
            EASE_OUT_EXPO,
            Some(ease_out_expo),
        );
        reg.register(
            &["EASEINOUTEXPO"],
            &[],
            "easeInOutExpo",
            EASE_IN_OUT_EXPO,
            Some(ease_in_out_expo),
        );
        reg.register(&["EASEINCIRC"], &[], "easeInCirc", EASE_IN_CIRC, Some(ease_in_circ));
        reg.register(
            &["EASEOUTCIRC"],
            &[],
            "easeOutCirc",
            EASE_OUT_CIRC,
            Some(ease_out_circ),
        );
        reg.register(
            &["EASEINOUTCIRC"],
            &[],
            "easeInOutCirc",
            EASE_IN_OUT_CIRC,
            Some(ease_in_out_circ),
        );
        reg.register(&["BOUNCEIN"], &["BOUNCEOUT"], "bounceIn", BOUNCE_IN, Some(bounce_in));
        reg.register(&["BOUNCEOUT"], &[], "bounceOut", BOUNCE_OUT, Some(bounce_out));
        reg.register(
            &["BOUNCEINOUT"],
            &["BOUNCEOUT"],
            "bounceInOut",
            BOUNCE_IN_OUT,
            Some(bounce_in_out),
        );
        reg.register(&["LANTERN"], &[], "lanternSignal", LANTERN_SIGNAL, Some(lantern));
        reg.register(&["HIGH"], &[], "high", HIGH, Some(high));
        reg.register(&["LOW"], &[], "low", LOW, Some(low));

        reg
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Evaluators
// ══════════════════════════════════════════════════════════════════════════

fn square(t: f32) -> f32 {
    if t < 0.5 {
        0.0
    } else {
        1.0
    }
}

fn triangle(t: f32) -> f32 {
    if t < 0.5 {
        t * 2.0
    } else {
        1.0 - (t * 2.0 - 1.0)
    }
}

fn ease_in(t: f32) -> f32 {
    t
}

fn ease_out(t: f32) -> f32 {
    1.0 - t
}

fn ease_in_sine(t: f32) -> f32 {
    1.0 - (t * PI * 0.5).cos()
}

fn ease_out_sine(t: f32) -> f32 {
    (t * PI * 0.5).sin()
}

fn ease_in_out_sine(t: f32) -> f32 {
    -((PI * t).cos() - 1.0) * 0.5
}

fn ease_in_expo(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else {
        2.0_f32.powf(10.0 * t - 10.0)
    }
}

fn ease_out_expo(t: f32) -> f32 {
    if t == 1.0 {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * t)
    }
}

fn ease_in_out_expo(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else if t < 0.5 {
        2.0_f32.powf(20.0 * t - 10.0) * 0.5
    } else {
        (2.0 - 2.0_f32.powf(-20.0 * t + 10.0)) * 0.5
    }
}

fn ease_in_circ(t: f32) -> f32 {
    1.0 - (1.0 - t * t).sqrt()
}

fn ease_out_circ(t: f32) -> f32 {
    (1.0 - (t - 1.0) * (t - 1.0)).sqrt()
}

fn ease_in_out_circ(t: f32) -> f32 {
    if t < 0.5 {
        (1.0 - (1.0 - 4.0 * t * t).sqrt()) * 0.5
    } else {
        ((1.0 - (-2.0 * t + 2.0) * (-2.0 * t + 2.0)).sqrt() + 1.0) * 0.5
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

fn bounce_in(t: f32) -> f32 {
    1.0 - bounce_out(1.0 - t)
}

fn bounce_in_out(t: f32) -> f32 {
    if t < 0.5 {
        (1.0 - bounce_out(1.0 - 2.0 * t)) * 0.5
    } else {
        (1.0 + bounce_out(2.0 * t - 1.0)) * 0.5
    }
}

fn lantern(t: f32) -> f32 {
    let t = t * 16.7552;
    let raw = (t * 3.0).sin() * (t * 1.5).cos() * (t * 1.125).sin() * 0.6818268596145769 + 0.5;
    raw.clamp(0.0, 1.0)
}

fn high(_t: f32) -> f32 {
    1.0
}

fn low(_t: f32) -> f32 {
    0.0
}

// ══════════════════════════════════════════════════════════════════════════
// C fragments
// ══════════════════════════════════════════════════════════════════════════

const RANDOM_SIGNAL: &str = r#"
typedef struct
{
    bool isLevel;
    int cache;
    unsigned long cacheTime;
} randCache;

int randomSignal( randCache* rc, int minVal, int maxVal, float freq, unsigned long t, float severity )
{
    if( (t-rc->cacheTime) >= (unsigned long)(1000.0f / freq) )
    {
        if( !rc->isLevel )
        {
            rc->cacheTime = t;
            rc->cache = random(minVal,maxVal+1);

            if( random(1000) > severity * 1000 )
            {
                rc->cacheTime = t;
                rc->cache = maxVal;
                rc->isLevel = true;
            }
        }
        else if( random(1000) < severity * 1000 )
        {
            rc->cacheTime = t;
            rc->isLevel = false;
        }
        else
        {
            rc->cache = maxVal;
        }
    }

    return rc->cache;
}"#;

const SQUARE_WAVE: &str = r#"
float squareWave( float t )
{
    return t < 0.5f ? 0.0f : 1.0f;
}"#;

const TRIANGLE_WAVE: &str = r#"
float triangleWave( float t )
{
    return t < 0.5f ? t*2.0f : 1.0f-(t*2.0f-1.0f);
}"#;

const EASE_IN: &str = r#"
float easeIn( float t )
{
    return t;
}"#;

const EASE_OUT: &str = r#"
float easeOut( float t )
{
    return 1.0f-t;
}"#;

const EASE_IN_SINE: &str = r#"
float easeInSine( float t )
{
    return 1.0f - cosf(t * M_PI_2);
}"#;

const EASE_OUT_SINE: &str = r#"
float easeOutSine( float t )
{
    return sinf(t * M_PI_2);
}"#;

const EASE_IN_OUT_SINE: &str = r#"
float easeInOutSine( float t )
{
    return -(cosf(M_PI * t) - 1.0f) * 0.5f;
}"#;

const EASE_IN_EXPO: &str = r#"
float easeInExpo( float t )
{
    return t == 0.0f ? 0.0f : powf(2.0f,10.0f * t - 10.0f);
}"#;

const EASE_OUT_EXPO: &str = r#"
float easeOutExpo( float t )
{
    return t == 1.0f ? 1.0f : 1.0f - powf(2.0f, -10.0f * t);
}"#;

const EASE_IN_OUT_EXPO: &str = r#"
float easeInOutExpo( float t )
{
    return t == 0.0f ? 0.0f : t == 1.0f ? 1.0f : t < 0.5f ? powf(2.0f, 20.0f * t - 10.0f) * 0.5f : (2.0f - powf(2.0f, -20.0f * t + 10.0f)) * 0.5f;
}"#;

const EASE_IN_CIRC: &str = r#"
float easeInCirc( float t )
{
    return 1.0f - sqrtf( 1.0f - t * t );
}"#;

const EASE_OUT_CIRC: &str = r#"
float easeOutCirc( float t )
{
    return sqrtf( 1.0f - ((t-1.0f) * (t-1.0f)));
}"#;

const EASE_IN_OUT_CIRC: &str = r#"
float easeInOutCirc( float t )
{
    return t < 0.5f ? (1.0f - sqrtf(1.0f - 4.0f*t*t)) * 0.5f : (sqrtf(1.0f - (-2.0f*t+2.0f)*(-2.0f*t+2.0f)) + 1.0f) * 0.5f;
}"#;

const BOUNCE_IN: &str = r#"
float bounceIn( float t )
{
    return 1.0f - bounceOut(1.0f - t);
}"#;

const BOUNCE_OUT: &str = r#"
float bounceOut( float t )
{
    const static float n1 = 7.5625f;
    const static float d1 = 2.75f;

    if (t < 1 / d1) {
        return n1 * t * t;
    } else if (t < 2 / d1) {
        return n1 * (t -= 1.5f / d1) * t + 0.75f;
    } else if (t < 2.5 / d1) {
        return n1 * (t -= 2.25f / d1) * t + 0.9375f;
    } else {
        return n1 * (t -= 2.625f / d1) * t + 0.984375f;
    }
}"#;

const BOUNCE_IN_OUT: &str = r#"
float bounceInOut( float t )
{
    return t < 0.5f ? (1.0f - bounceOut(1.0f - 2.0f * t)) * 0.5f : (1.0f + bounceOut(2.0f * t - 1.0f)) * 0.5f;
}"#;

const LANTERN_SIGNAL: &str = r#"
float lanternSignal( float t )
{
    float e1 = 3.0f;
    float e2 = 1.5f;
    float e3 = 1.125f;
    t *= 16.7552f;
    float temp = sinf(t*e1)*cosf(t*e2)*sinf(t*e3)*0.6818268596145769f+0.5f;
    return temp < 0.0f ? 0.0f : temp > 1.0f ? 1.0f : temp;
}"#;

const HIGH: &str = r#"
float high( float t )
{
    return 1.0f;
}"#;

const LOW: &str = r#"
float low( float t )
{
    return 0.0f;
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(alias: &str, t: f32) -> f32 {
        let reg = Registry::standard();
        let entry = reg.resolve(alias).unwrap();
        (entry.evaluator.unwrap())(t)
    }

    #[test]
    fn test_endpoint_values() {
        for alias in [
            "EASEIN",
            "EASEINSINE",
            "EASEINEXPO",
            "EASEINCIRC",
            "BOUNCEIN",
            "BOUNCEOUT",
        ] {
            assert!(eval(alias, 0.0).abs() < 1e-5, "{alias} at 0");
            assert!((eval(alias, 1.0) - 1.0).abs() < 1e-4, "{alias} at 1");
        }
        // EASEOUT is the inverted linear ramp
        assert!((eval("EASEOUT", 0.0) - 1.0).abs() < 1e-5);
        assert!(eval("EASEOUT", 1.0).abs() < 1e-5);
        // the remaining ease-out family still rises 0 → 1
        for alias in ["EASEOUTSINE", "EASEOUTEXPO", "EASEOUTCIRC"] {
            assert!(eval(alias, 0.0).abs() < 1e-3, "{alias} at 0");
            assert!((eval(alias, 1.0) - 1.0).abs() < 1e-4, "{alias} at 1");
        }
    }

    #[test]
    fn test_in_out_eases_cross_midpoint() {
        for alias in ["PULSE", "EASEINOUTEXPO", "EASEINOUTCIRC", "BOUNCEINOUT"] {
            assert!(eval(alias, 0.0).abs() < 1e-5, "{alias} at 0");
            assert!((eval(alias, 1.0) - 1.0).abs() < 1e-4, "{alias} at 1");
            assert!((eval(alias, 0.5) - 0.5).abs() < 1e-5, "{alias} at 0.5");
        }
        // triangle peaks mid-phase and returns to its start
        assert!(eval("TRIANGLE", 0.0).abs() < 1e-5);
        assert!((eval("TRIANGLE", 0.5) - 1.0).abs() < 1e-5);
        assert!(eval("TRIANGLE", 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_square_and_levels() {
        assert_eq!(eval("BOX", 0.25), 0.0);
        assert_eq!(eval("SQUARE", 0.75), 1.0);
        assert_eq!(eval("HIGH", 0.3), 1.0);
        assert_eq!(eval("LOW", 0.3), 0.0);
    }

    #[test]
    fn test_lantern_stays_in_range() {
        for i in 0..=100 {
            let v = eval("LANTERN", i as f32 / 100.0);
            assert!((0.0..=1.0).contains(&v), "lantern({i}) = {v}");
        }
    }

    #[test]
    fn test_bounce_in_mirrors_bounce_out() {
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let a = eval("BOUNCEIN", t);
            let b = 1.0 - eval("BOUNCEOUT", 1.0 - t);
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_every_entry_has_fragment_and_func_name() {
        let reg = Registry::standard();
        for name in reg.canonical_names() {
            let entry = reg.resolve(name).unwrap();
            assert!(!entry.fragment.trim().is_empty(), "{name} fragment");
            assert!(entry.fragment.contains(entry.func_name), "{name} declares {}", entry.func_name);
        }
    }
}
