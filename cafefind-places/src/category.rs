use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Searchable place categories, mapped to the provider's category ids
pub enum Category {
    #[default]
    Cafe,
    Restaurant,
    FastFood,
    Bar,
    Pub,
    IceCream,
    Bakery,
}

impl Category {
    /// Provider category id (see the Foursquare category taxonomy)
    pub fn id(&self) -> &'static str {
        match self {
            Self::Cafe => "13032",
            Self::Restaurant => "13065",
            Self::FastFood => "13145",
            Self::Bar => "13003",
            Self::Pub => "13066",
            Self::IceCream => "13079",
            Self::Bakery => "13072",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::FastFood => "fast_food",
            Self::Bar => "bar",
            Self::Pub => "pub",
            Self::IceCream => "ice_cream",
            Self::Bakery => "bakery",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cafe" => Ok(Self::Cafe),
            "restaurant" => Ok(Self::Restaurant),
            "fast_food" => Ok(Self::FastFood),
            "bar" => Ok(Self::Bar),
            "pub" => Ok(Self::Pub),
            "ice_cream" => Ok(Self::IceCream),
            "bakery" => Ok(Self::Bakery),
            other => Err(format!("Unknown category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_the_provider_taxonomy() {
        assert_eq!(Category::Cafe.id(), "13032");
        assert_eq!(Category::Restaurant.id(), "13065");
        assert_eq!(Category::FastFood.id(), "13145");
        assert_eq!(Category::Bar.id(), "13003");
        assert_eq!(Category::Pub.id(), "13066");
        assert_eq!(Category::IceCream.id(), "13079");
        assert_eq!(Category::Bakery.id(), "13072");
    }

    #[test]
    fn names_round_trip() {
        for category in [
            Category::Cafe,
            Category::Restaurant,
            Category::FastFood,
            Category::Bar,
            Category::Pub,
            Category::IceCream,
            Category::Bakery,
        ] {
            assert_eq!(category.name().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn default_is_cafe() {
        assert_eq!(Category::default(), Category::Cafe);
    }
}
