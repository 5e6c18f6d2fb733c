//! Event type normalization.
//!
//! Raw `EVTYPE` labels are free text: plurals, abbreviations (`TSTM`,
//! `FLD`), misspellings, wind speeds and hail sizes glued onto the name,
//! and compound descriptions joined by `/`, `&` or `AND`. A [`RuleSet`]
//! folds a label through an ordered list of regex rewrites so that most of
//! that variance converges on the directive's 48 event names.
//!
//! Order matters. Each rule sees the output of every rule before it, the
//! lexical cleanup has to run before any anchored collapse, and within the
//! collapses the first rule to claim a label wins. Every replacement is a
//! fixed point of the whole cascade, which is what makes normalization
//! idempotent. Labels no rule touches pass through unchanged.

use regex::{NoExpand, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// The built-in cascade as (pattern, literal replacement) pairs.
const STANDARD_RULES: &[(&str, &str)] = &[
    // Lexical cleanup: wind speeds, hail sizes and F-scale ratings, a
    // dangling "(MINOR" style tail, separators, whitespace, stray
    // punctuation at either end.
    (
        r"\s*\(?(?:\bF|G)?\d[\d.]*(?:\s*(?:MPH|KTS?|INCHES|INCH|IN)\b)?\)?",
        "",
    ),
    (r"\s*\([^)]*$", ""),
    (r"(?:\s*(?:[\\/&,;]|\s-\s|\bAND\b)\s*)+", "/"),
    (r"\s+", " "),
    (r"^[\s/.-]+|[\s/.-]+$", ""),
    // Abbreviations, plurals and misspellings
    (
        r"\b(?:TSTMW?|THUNDERSTORMS|THUNDERSTROM|THUNDERTORM|TUNDERSTORM|THUNERSTORM|THUDERSTORM|THUNDEERSTORM|THUNDESTORM|THUNDERESTORM|THUNDERSTORMW)\b",
        "THUNDERSTORM",
    ),
    (r"\bWINDS+\b|\bWND\b", "WIND"),
    (r"\bFLOOD(?:ING|IN|S|ED)\b|\bFLDG?\b", "FLOOD"),
    (r"\bSML\b", "SMALL"),
    (r"\bSTORMS\b", "STORM"),
    (r"\bHVY\b", "HEAVY"),
    (r"\bCSTL\b", "COASTAL"),
    (r"\b(?:LIGHTING|LIGNTNING|LIGHTNINGS)\b", "LIGHTNING"),
    (r"\bAVALANCE\b", "AVALANCHE"),
    (r"\bTORNDAO\b|\bTORNADOE?S\b", "TORNADO"),
    (r"\bPRECIP\b", "PRECIPITATION"),
    // Tropical cyclones. Named storms collapse onto the directive name; a
    // bare TYPHOON keeps its own slash form (see RULE_EXEMPTIONS).
    (r"^HURRICANE.*", "HURRICANE (TYPHOON)"),
    (r"^TYPHOON$", "HURRICANE/TYPHOON"),
    (r"^TROPICAL STORM\b.*", "TROPICAL STORM"),
    (r"^TROPICAL DEPRESSION\b.*", "TROPICAL DEPRESSION"),
    // Marine variants before their land counterparts
    (r"^MARINE THUNDERSTORM\b.*", "MARINE THUNDERSTORM WIND"),
    (r"^MARINE HAIL\b.*", "MARINE HAIL"),
    (r"^MARINE HIGH WIND\b.*", "MARINE HIGH WIND"),
    (r"^MARINE STRONG WIND\b.*", "MARINE STRONG WIND"),
    // Convective
    (r"^(?:SEVERE )?THUNDERSTORM\b.*", "THUNDERSTORM WIND"),
    (
        r"^(?:DRY |WET )?(?:MI[CR]+OBURST|DOWNBURST|GUSTNADO)\b.*",
        "THUNDERSTORM WIND",
    ),
    (r"^(?:COLD AIR )?(?:TORNADO|LANDSPOUT)\b.*", "TORNADO"),
    (r"^FUNNEL\b.*", "FUNNEL CLOUD"),
    (r"^WATER ?SPOUTS?\b.*", "WATERSPOUT"),
    (r"^(?:SMALL )?HAIL\b.*", "HAIL"),
    (r"^LIGHTNING\b.*", "LIGHTNING"),
    // Floods. The broad collapse only claims labels that lead with a
    // river/urban qualifier or with FLOOD itself, so FLASH FLOOD, COASTAL
    // FLOOD and LAKESHORE FLOOD survive it for the refinements below.
    (r"^FLOOD/FLASH\b.*", "FLASH FLOOD"),
    (
        r"^(?:(?:URBAN|SMALL|STREAM|RIVER|MAJOR|MINOR|RURAL|LOCAL|STREET|HIGHWAY|ICE JAM|SNOWMELT|BREAKUP|HEAVY RAIN)\b.*\bFLOOD|FLOOD|HIGH WATER)\b.*",
        "FLOOD",
    ),
    (r"^FLASH ?FLOOD.*", "FLASH FLOOD"),
    (
        r"^(?:COASTAL|TIDAL|BEACH)\b.*\bFLOOD\b.*|^COASTAL (?:SURGE|EROSION)$|^BEACH EROSION$",
        "COASTAL FLOOD",
    ),
    (r"^LAKE(?:SHORE)? FLOOD\b.*", "LAKESHORE FLOOD"),
    // Temperature
    (
        r"^(?:EXCESSIVE|EXTREME|RECORD) HEAT\b.*|^HEAT WAVES?\b.*|^RECORD HIGH(?: TEMPERATURES?)?$|^HYPERTHERMIA\b.*",
        "EXCESSIVE HEAT",
    ),
    (
        r"^(?:HEAT|WARM WEATHER|UNSEASONABLY WARM|RECORD WARMTH|VERY WARM)\b.*",
        "HEAT",
    ),
    (
        r"^DROUGHT\b.*|^(?:UNSEASONABLY|ABNORMALLY|RECORD|EXCESSIVELY) DRY\b.*|^DRY(?: CONDITIONS| SPELL| WEATHER)?$",
        "DROUGHT",
    ),
    (
        r"^(?:EXTREME|RECORD|EXCESSIVE) (?:COLD|WIND ?CHILL)\b.*|^EXTREME WINDCHILL\b.*|^HYPOTHERMIA\b.*",
        "EXTREME COLD/WIND CHILL",
    ),
    (
        r"^(?:COLD|WIND ?CHILL|UNSEASONABL[EY] COLD|EXTENDED COLD|LOW TEMPERATURE|COLD WEATHER|COLD TEMPERATURES?|COLD WAVE)\b.*",
        "COLD/WIND CHILL",
    ),
    (
        r"^(?:(?:EARLY|DAMAGING|HARD|AGRICULTURAL|LATE) )?(?:FROST|FREEZE)\b.*",
        "FROST/FREEZE",
    ),
    // Fog and smoke
    (r"^FREEZING FOG\b.*|^ICE FOG$", "FREEZING FOG"),
    (r"^(?:(?:PATCHY )?DENSE )?FOG\b.*", "DENSE FOG"),
    (r"^(?:DENSE )?SMOKE\b.*", "DENSE SMOKE"),
    // Winter
    (r"^WINTER STORM\b.*", "WINTER STORM"),
    (r"^ICE STORM\b.*|^GLAZE ICE\b.*", "ICE STORM"),
    (r"^(?:LAKE[- ]?EFFECT SNOW|LAKE SNOW)\b.*", "LAKE-EFFECT SNOW"),
    (r"^(?:GROUND )?BLIZZARD\b.*", "BLIZZARD"),
    (
        r"^(?:HEAVY|EXCESSIVE|RECORD) SNOW\b.*|^SNOW(?:FALL)?$|^SNOW ?SQUALLS?\b.*|^SNOWSTORM$",
        "HEAVY SNOW",
    ),
    (
        r"^(?:WINTER WEATHER|WINTRY MIX|WINTER MIX|MIXED PRECIPITATION|(?:LIGHT )?FREEZING (?:RAIN|DRIZZLE)|LIGHT SNOW|BLOWING SNOW|SNOW/ICE|ICE/SNOW|SNOW/RAIN|RAIN/SNOW|GLAZE|BLACK ICE|ICY ROADS|ICE ON ROADS?|ICE ROADS|MODERATE SNOW(?:FALL)?)\b.*|^ICE$",
        "WINTER WEATHER",
    ),
    (r"^SLEET\b.*", "SLEET"),
    (r"^AVALANCHE\b.*", "AVALANCHE"),
    // Rain
    (
        r"^(?:HEAVY|EXCESSIVE|RECORD|TORRENTIAL) (?:RAIN|PRECIPITATION|SHOWERS?)\w*\b.*|^RAIN(?:FALL|S)?$|^UNSEASONAL RAIN$",
        "HEAVY RAIN",
    ),
    // Coast and sea
    (r"^RIP CURRENTS?\b.*", "RIP CURRENT"),
    (
        r"^(?:HEAVY|HIGH|HAZARDOUS|ROUGH) (?:SURF|SWELLS?|WAVES?|SEAS?)\b.*|^ROGUE WAVE$",
        "HIGH SURF",
    ),
    (
        r"^STORM SURGE\b.*|^(?:ASTRONOMICAL )?HIGH TIDES?$",
        "STORM SURGE/TIDE",
    ),
    // Wind, after the cold rules have taken WIND CHILL
    (r"^HIGH WIND\b.*", "HIGH WIND"),
    (
        r"^(?:(?:STRONG|GUSTY|GRADIENT|NON[ -]?SEVERE|NON[ -]?THUNDERSTORM) WIND\b.*|WIND(?: DAMAGE| STORM| GUSTS?)?)$",
        "STRONG WIND",
    ),
    (r"^DUST DEVIL\b.*", "DUST DEVIL"),
    (r"^(?:DUST ?STORM|BLOWING DUST|SAHARAN DUST)\b.*", "DUST STORM"),
    // Everything else
    (
        r"^(?:(?:WILD|FOREST|BRUSH|GRASS|RANGE)(?:/FOREST)? ?FIRES?|WILDFIRES?)\b.*",
        "WILDFIRE",
    ),
    (
        r"^(?:(?:LAND|MUD|ROCK) ?(?:SLIDES?|SLUMP)|DEBRIS FLOW)\b.*",
        "DEBRIS FLOW",
    ),
    (r"^VOLCANIC (?:ASH|ERUPTION)\b.*", "VOLCANIC ASH"),
    (r"^TSUNAMI\b.*", "TSUNAMI"),
    (r"^SEICHE\b.*", "SEICHE"),
];

/// Exact values a built-in rule leaves untouched, keyed by its pattern.
/// `HURRICANE/TYPHOON` is the TYPHOON target and must survive a second
/// pass through the hurricane collapse.
const RULE_EXEMPTIONS: &[(&str, &str)] = &[(r"^HURRICANE.*", "HURRICANE/TYPHOON")];

/// A rule as written in an extra-rules JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub replacement: String,
    /// Exact value the rule must not rewrite
    #[serde(default)]
    pub except: Option<String>,
}

/// One compiled rewrite: every non-overlapping match of `pattern` in the
/// current value is replaced by the literal `replacement`, unless the
/// whole value equals the rule's exemption.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
    exempt: Option<String>,
}

impl Rule {
    pub fn new(pattern: &str, replacement: &str) -> PipelineResult<Self> {
        let compiled = Regex::new(pattern).map_err(|source| PipelineError::InvalidRule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Rule {
            pattern: compiled,
            replacement: replacement.to_string(),
            exempt: None,
        })
    }

    /// Leave the exact value `value` alone.
    pub fn except(mut self, value: &str) -> Self {
        self.exempt = Some(value.to_string());
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.exempt.as_deref() == Some(value) {
            return Cow::Borrowed(value);
        }
        self.pattern
            .replace_all(value, NoExpand(self.replacement.as_str()))
    }
}

/// The ordered, immutable rewrite cascade.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// The built-in cascade.
    pub fn standard() -> PipelineResult<Self> {
        let mut set = Self::from_pairs(STANDARD_RULES)?;
        for rule in &mut set.rules {
            if let Some((_, value)) = RULE_EXEMPTIONS
                .iter()
                .find(|(pattern, _)| *pattern == rule.pattern())
            {
                rule.exempt = Some(value.to_string());
            }
        }
        Ok(set)
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> PipelineResult<Self> {
        let rules = pairs
            .iter()
            .map(|(pattern, replacement)| Rule::new(pattern, replacement))
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(RuleSet { rules })
    }

    /// Append rules from a JSON array of `{"pattern", "replacement"}`
    /// objects. They run after the built-in cascade, in file order; the
    /// built-in order is never changed.
    pub fn extend_from_file<P: AsRef<Path>>(&mut self, path: P) -> PipelineResult<usize> {
        let text = fs::read_to_string(path.as_ref())?;
        let specs: Vec<RuleSpec> = serde_json::from_str(&text)?;
        let added = specs.len();
        for spec in specs {
            let rule = Rule::new(&spec.pattern, &spec.replacement)?;
            self.rules.push(match &spec.except {
                Some(value) => rule.except(value),
                None => rule,
            });
        }
        Ok(added)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Upper-case and trim `raw`, then fold it through every rule in order.
    pub fn normalize(&self, raw: &str) -> String {
        let mut value = raw.trim().to_uppercase();
        for rule in &self.rules {
            let rewritten = match rule.apply(&value) {
                Cow::Borrowed(_) => None,
                Cow::Owned(s) => Some(s),
            };
            if let Some(s) = rewritten {
                value = s;
            }
        }
        value
    }
}

/// Normalize one label with the given cascade.
pub fn normalize(raw: &str, rules: &RuleSet) -> String {
    rules.normalize(raw)
}
