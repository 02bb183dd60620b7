// ---------------------------------------------------------------------------
// Feature – one of the nine input measurements
// ---------------------------------------------------------------------------

/// Environmental measurements in the fixed order the models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Temperature,
    Humidity,
    Pm25,
    Pm10,
    No2,
    So2,
    Co,
    IndustrialProximity,
    PopulationDensity,
}

impl Feature {
    /// All features, in model input order.
    pub const ALL: [Feature; 9] = [
        Feature::Temperature,
        Feature::Humidity,
        Feature::Pm25,
        Feature::Pm10,
        Feature::No2,
        Feature::So2,
        Feature::Co,
        Feature::IndustrialProximity,
        Feature::PopulationDensity,
    ];

    /// Column name used in training data.
    pub fn key(self) -> &'static str {
        match self {
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Pm25 => "pm25",
            Feature::Pm10 => "pm10",
            Feature::No2 => "no2",
            Feature::So2 => "so2",
            Feature::Co => "co",
            Feature::IndustrialProximity => "industrial_proximity",
            Feature::PopulationDensity => "population_density",
        }
    }

    /// Human readable label for the input form.
    pub fn label(self) -> &'static str {
        match self {
            Feature::Temperature => "Temperature",
            Feature::Humidity => "Humidity",
            Feature::Pm25 => "PM2.5",
            Feature::Pm10 => "PM10",
            Feature::No2 => "NO₂",
            Feature::So2 => "SO₂",
            Feature::Co => "CO",
            Feature::IndustrialProximity => "Proximity to industry",
            Feature::PopulationDensity => "Population density",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Feature::Temperature => "°C",
            Feature::Humidity => "%",
            Feature::Pm25 | Feature::Pm10 => "µg/m³",
            Feature::No2 | Feature::So2 => "ppb",
            Feature::Co => "ppm",
            Feature::IndustrialProximity => "km",
            Feature::PopulationDensity => "people/km²",
        }
    }

    /// Inclusive valid range. Only temperature may be negative.
    pub fn range(self) -> (f64, f64) {
        match self {
            Feature::Temperature => (-50.0, 60.0),
            Feature::Humidity => (0.0, 100.0),
            _ => (0.0, f64::INFINITY),
        }
    }

    /// Drag/input step for the form widget.
    pub fn step(self) -> f64 {
        match self {
            Feature::Co => 0.01,
            Feature::PopulationDensity => 1.0,
            _ => 0.1,
        }
    }

    /// Clamp a raw value into [`Feature::range`]. NaN collapses to the default.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

// ---------------------------------------------------------------------------
// FeatureVector – one observation, immutable once built
// ---------------------------------------------------------------------------

/// A single observation ready to be fed into a predictor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    values: [f64; 9],
}

impl FeatureVector {
    /// Build a vector from raw form values, clamping each into its range.
    pub fn from_values(values: [f64; 9]) -> Self {
        let mut clamped = values;
        for (slot, feature) in clamped.iter_mut().zip(Feature::ALL) {
            *slot = feature.clamp(*slot);
        }
        Self { values: clamped }
    }

    #[cfg(test)]
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature as usize]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate `(feature, value)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().zip(self.values.iter().copied())
    }
}
