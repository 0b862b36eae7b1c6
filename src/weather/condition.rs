//! Classification of weather conditions into illustrated categories.
//!
//! Rules are checked in a fixed order and the first match wins, so a
//! description mentioning both snow and rain lands in [`ConditionCategory::SnowWithRain`]
//! rather than in either of the single-precipitation categories.

/// Illustrated weather category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCategory {
    SnowWithRain,
    Thunderstorm,
    Snow,
    Rain,
    Clouds,
    Clear,
    Mist,
    /// Nothing matched; illustrated like clear weather.
    Unclassified,
}

type Predicate = fn(main: &str, description: &str) -> bool;

/// Ordered classification rules. Inputs are lower-cased before evaluation.
const RULES: &[(Predicate, ConditionCategory)] = &[
    (is_snow_with_rain, ConditionCategory::SnowWithRain),
    (is_thunderstorm, ConditionCategory::Thunderstorm),
    (is_snow, ConditionCategory::Snow),
    (is_rain, ConditionCategory::Rain),
    (is_clouds, ConditionCategory::Clouds),
    (is_clear, ConditionCategory::Clear),
    (is_mist, ConditionCategory::Mist),
];

fn is_snow_with_rain(main: &str, description: &str) -> bool {
    (description.contains("снег") && description.contains("дождь"))
        || (main.contains("snow") && description.contains("rain"))
}

fn is_thunderstorm(main: &str, description: &str) -> bool {
    main.contains("thunderstorm") || description.contains("гроза")
}

fn is_snow(main: &str, description: &str) -> bool {
    main.contains("snow") || description.contains("снег")
}

fn is_rain(main: &str, description: &str) -> bool {
    main.contains("rain") || main.contains("drizzle") || description.contains("дождь")
}

fn is_clouds(main: &str, description: &str) -> bool {
    main.contains("clouds") || description.contains("облачно")
}

fn is_clear(main: &str, description: &str) -> bool {
    main.contains("clear") || description.contains("ясно")
}

fn is_mist(main: &str, description: &str) -> bool {
    main.contains("mist") || main.contains("fog") || description.contains("туман")
}

/// Classifies a provider condition group and free-text description.
#[must_use]
pub fn classify(main: &str, description: &str) -> ConditionCategory {
    let main = main.to_lowercase();
    let description = description.to_lowercase();

    RULES
        .iter()
        .find(|(matches, _)| matches(&main, &description))
        .map_or(ConditionCategory::Unclassified, |&(_, category)| category)
}

/// Whether a forecast point brings rain, as reported in the morning summary.
#[must_use]
pub fn mentions_rain(main: &str, description: &str) -> bool {
    main.to_lowercase().contains("rain") || description.to_lowercase().contains("дождь")
}

/// Whether a forecast point brings snow, as reported in the morning summary.
#[must_use]
pub fn mentions_snow(main: &str, description: &str) -> bool {
    main.to_lowercase().contains("snow") || description.to_lowercase().contains("снег")
}

impl ConditionCategory {
    /// File name of the picture inside the photos directory.
    #[must_use]
    pub const fn image_file(self) -> &'static str {
        match self {
            Self::SnowWithRain => "Снег с дождём.png",
            Self::Thunderstorm => "Молнии.png",
            Self::Snow => "Снег.png",
            Self::Rain => "Дождик.png",
            Self::Clouds => "Облачно.png",
            Self::Clear | Self::Unclassified => "Солнечно.jpg",
            Self::Mist => "туман.png",
        }
    }

    /// Advice line appended to the weather reply.
    #[must_use]
    pub fn comment(self, description: &str) -> String {
        match self {
            Self::SnowWithRain => "❄️🌧️ Снег с дождем! Одевайся теплее и бери зонт.".to_owned(),
            Self::Thunderstorm => {
                "⚡ Осторожно! Возможна гроза. Лучше остаться в помещении.".to_owned()
            }
            Self::Snow => "❄️ Сегодня снег! Одевайся теплее.".to_owned(),
            Self::Rain => "🌧️ Не забудь зонтик! Сегодня ожидается дождь.".to_owned(),
            Self::Clouds => "☁️ Сегодня облачно.".to_owned(),
            Self::Clear => "☀️ Сегодня солнечно! Отличный день для прогулки.".to_owned(),
            Self::Mist => "🌫️ Сегодня туман. Будь осторожен на дороге.".to_owned(),
            Self::Unclassified => format!("Погода: {}", description.to_lowercase()),
        }
    }
}
