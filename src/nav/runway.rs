/// A runway threshold at an airport.
#[derive(Debug, Clone, PartialEq)]
pub struct Runway {
    icao: String,
    name: String,
    position: (f64, f64),
}

impl Runway {
    pub fn new(icao: &str, name: &str, position: (f64, f64)) -> Self {
        Self {
            icao: icao.to_uppercase(),
            name: name.to_uppercase(),
            position,
        }
    }

    pub fn icao(&self) -> &str {
        &self.icao
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Key used by procedures and route strings, e.g. `KLAS07R`.
    pub fn procedure_key(&self) -> String {
        format!("{}{}", self.icao, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_key() {
        let runway = Runway::new("klas", "07r", (36.0714, -115.1634));
        assert_eq!(runway.procedure_key(), "KLAS07R");
        assert_eq!(runway.name(), "07R");
    }
}
