use std::fmt;
use std::str::FromStr;

/// Named operator inputs, addressed the way the control surface labels them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlChannel {
    BarPressure,
    Throttle,
}

impl ControlChannel {
    pub fn name(&self) -> &'static str {
        match self {
            ControlChannel::BarPressure => "barpressure",
            ControlChannel::Throttle => "throttle",
        }
    }
}

impl fmt::Display for ControlChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barpressure" => Ok(ControlChannel::BarPressure),
            "throttle" => Ok(ControlChannel::Throttle),
            other => Err(format!("unknown control channel '{other}'")),
        }
    }
}

/// The operator's side of the controls: free-text numeric fields plus the
/// "holding the bar" gate.
///
/// Values are stored as entered. Reading a field that does not parse yields
/// NaN; sanitising is left to the control model.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    bar_pressure: String,
    throttle: String,
    holding_bar: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        ControlPanel::new()
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        ControlPanel {
            bar_pressure: "0".to_string(),
            throttle: "0".to_string(),
            holding_bar: false,
        }
    }

    pub fn text(&self, channel: ControlChannel) -> &str {
        match channel {
            ControlChannel::BarPressure => &self.bar_pressure,
            ControlChannel::Throttle => &self.throttle,
        }
    }

    pub fn set_text(&mut self, channel: ControlChannel, text: impl Into<String>) {
        let text = text.into();
        match channel {
            ControlChannel::BarPressure => self.bar_pressure = text,
            ControlChannel::Throttle => self.throttle = text,
        }
    }

    pub fn set_value(&mut self, channel: ControlChannel, value: f64) {
        self.set_text(channel, value.to_string());
    }

    pub fn value(&self, channel: ControlChannel) -> f64 {
        self.text(channel).trim().parse::<f64>().unwrap_or(f64::NAN)
    }

    pub fn holding_bar(&self) -> bool {
        self.holding_bar
    }

    pub fn set_holding_bar(&mut self, holding: bool) {
        self.holding_bar = holding;
    }
}
