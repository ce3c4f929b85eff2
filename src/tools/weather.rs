//! Simulated weather lookup for the `get_weather` tool.

/// A canned weather observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherReport {
    /// Temperature, already formatted with its unit.
    pub temperature: &'static str,
    /// Sky condition.
    pub condition: &'static str,
    /// Relative humidity, already formatted.
    pub humidity: &'static str,
}

const KNOWN_CITIES: [(&str, WeatherReport); 3] = [
    (
        "San Francisco",
        WeatherReport {
            temperature: "68°F",
            condition: "Foggy",
            humidity: "85%",
        },
    ),
    (
        "New York",
        WeatherReport {
            temperature: "75°F",
            condition: "Sunny",
            humidity: "60%",
        },
    ),
    (
        "London",
        WeatherReport {
            temperature: "62°F",
            condition: "Rainy",
            humidity: "90%",
        },
    ),
];

const UNKNOWN_CITY: WeatherReport = WeatherReport {
    temperature: "72°F",
    condition: "Unknown",
    humidity: "70%",
};

/// Looks up the stub report for `city` (case-insensitive).
///
/// Cities outside the fixed table get a neutral default report.
#[must_use]
pub fn lookup(city: &str) -> WeatherReport {
    let wanted = city.trim();
    KNOWN_CITIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map_or(UNKNOWN_CITY, |(_, report)| *report)
}

/// Renders a report as the tool's text output.
#[must_use]
pub fn render(city: &str, report: &WeatherReport) -> String {
    format!(
        "Weather in {city}:\n🌡️ Temperature: {}\n🌤️ Condition: {}\n💧 Humidity: {}",
        report.temperature, report.condition, report.humidity
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_city() {
        let report = lookup("London");
        assert_eq!(report.condition, "Rainy");
        assert_eq!(report.temperature, "62°F");
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert_eq!(lookup("  new york "), lookup("New York"));
    }

    #[test]
    fn unknown_city_gets_default() {
        assert_eq!(lookup("Atlantis"), UNKNOWN_CITY);
    }

    #[test]
    fn render_mentions_city() {
        let text = render("Paris", &lookup("Paris"));
        assert!(text.starts_with("Weather in Paris:"));
        assert!(text.contains("Humidity: 70%"));
    }
}
