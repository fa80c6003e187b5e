use super::MetricsResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RatioGroup {
    Liquidity,
    Profitability,
    Efficiency,
    Leverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Multiple,
    Percent,
    Coverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RatioKind {
    CurrentRatio,
    QuickRatio,
    CashRatio,
    GrossProfitMargin,
    OperatingMargin,
    NetProfitMargin,
    ReturnOnAssets,
    ReturnOnEquity,
    AssetTurnover,
    InventoryTurnover,
    ReceivablesTurnover,
    DebtToEquity,
    DebtToAssets,
    InterestCoverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rating {
    Poor,
    Fair,
    Good,
    Excellent,
}

struct Thresholds {
    excellent: f64,
    good: f64,
    fair: f64,
}

const fn t(excellent: f64, good: f64, fair: f64) -> Thresholds {
    Thresholds {
        excellent,
        good,
        fair,
    }
}

impl RatioKind {
    pub const ALL: [RatioKind; 14] = [
        RatioKind::CurrentRatio,
        RatioKind::QuickRatio,
        RatioKind::CashRatio,
        RatioKind::GrossProfitMargin,
        RatioKind::OperatingMargin,
        RatioKind::NetProfitMargin,
        RatioKind::ReturnOnAssets,
        RatioKind::ReturnOnEquity,
        RatioKind::AssetTurnover,
        RatioKind::InventoryTurnover,
        RatioKind::ReceivablesTurnover,
        RatioKind::DebtToEquity,
        RatioKind::DebtToAssets,
        RatioKind::InterestCoverage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RatioKind::CurrentRatio => "currentRatio",
            RatioKind::QuickRatio => "quickRatio",
            RatioKind::CashRatio => "cashRatio",
            RatioKind::GrossProfitMargin => "grossProfitMargin",
            RatioKind::OperatingMargin => "operatingMargin",
            RatioKind::NetProfitMargin => "netProfitMargin",
            RatioKind::ReturnOnAssets => "returnOnAssets",
            RatioKind::ReturnOnEquity => "returnOnEquity",
            RatioKind::AssetTurnover => "assetTurnover",
            RatioKind::InventoryTurnover => "inventoryTurnover",
            RatioKind::ReceivablesTurnover => "receivablesTurnover",
            RatioKind::DebtToEquity => "debtToEquity",
            RatioKind::DebtToAssets => "debtToAssets",
            RatioKind::InterestCoverage => "interestCoverage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatioKind::CurrentRatio => "Current Ratio",
            RatioKind::QuickRatio => "Quick Ratio",
            RatioKind::CashRatio => "Cash Ratio",
            RatioKind::GrossProfitMargin => "Gross Profit Margin",
            RatioKind::OperatingMargin => "Operating Margin",
            RatioKind::NetProfitMargin => "Net Profit Margin",
            RatioKind::ReturnOnAssets => "Return on Assets",
            RatioKind::ReturnOnEquity => "Return on Equity",
            RatioKind::AssetTurnover => "Asset Turnover",
            RatioKind::InventoryTurnover => "Inventory Turnover",
            RatioKind::ReceivablesTurnover => "Receivables Turnover",
            RatioKind::DebtToEquity => "Debt to Equity",
            RatioKind::DebtToAssets => "Debt to Assets",
            RatioKind::InterestCoverage => "Interest Coverage",
        }
    }

    pub fn group(self) -> RatioGroup {
        match self {
            RatioKind::CurrentRatio | RatioKind::QuickRatio | RatioKind::CashRatio => {
                RatioGroup::Liquidity
            }
            RatioKind::GrossProfitMargin
            | RatioKind::OperatingMargin
            | RatioKind::NetProfitMargin
            | RatioKind::ReturnOnAssets
            | RatioKind::ReturnOnEquity => RatioGroup::Profitability,
            RatioKind::AssetTurnover
            | RatioKind::InventoryTurnover
            | RatioKind::ReceivablesTurnover => RatioGroup::Efficiency,
            RatioKind::DebtToEquity | RatioKind::DebtToAssets | RatioKind::InterestCoverage => {
                RatioGroup::Leverage
            }
        }
    }

    pub fn unit(self) -> Unit {
        match self.group() {
            RatioGroup::Profitability => Unit::Percent,
            _ if self == RatioKind::InterestCoverage => Unit::Coverage,
            _ => Unit::Multiple,
        }
    }

    fn thresholds(self) -> Option<Thresholds> {
        Some(match self {
            RatioKind::CurrentRatio => t(2.5, 2.0, 1.5),
            RatioKind::QuickRatio => t(1.5, 1.2, 1.0),
            RatioKind::CashRatio => t(0.5, 0.3, 0.2),
            RatioKind::GrossProfitMargin => t(50.0, 30.0, 20.0),
            RatioKind::OperatingMargin => t(20.0, 15.0, 10.0),
            RatioKind::ReturnOnAssets => t(10.0, 5.0, 2.0),
            RatioKind::AssetTurnover => t(2.0, 1.0, 0.5),
            RatioKind::InventoryTurnover => t(8.0, 6.0, 4.0),
            RatioKind::ReceivablesTurnover => t(12.0, 8.0, 6.0),
            RatioKind::DebtToEquity => t(0.7, 0.5, 0.4),
            RatioKind::DebtToAssets => t(0.7, 0.6, 0.5),
            RatioKind::InterestCoverage => t(10.0, 5.0, 2.5),
            RatioKind::NetProfitMargin | RatioKind::ReturnOnEquity => return None,
        })
    }

    /// Leverage ratios are better when lower, so they are rated on an inverted scale.
    fn rated_value(self, value: f64) -> f64 {
        match self {
            RatioKind::DebtToEquity => 1.0 / (value + 1.0),
            RatioKind::DebtToAssets => 1.0 - value,
            _ => value,
        }
    }
}

pub fn rate(kind: RatioKind, value: f64) -> Option<Rating> {
    let th = kind.thresholds()?;
    if !value.is_finite() {
        return None;
    }
    let v = kind.rated_value(value);
    Some(if v >= th.excellent {
        Rating::Excellent
    } else if v >= th.good {
        Rating::Good
    } else if v >= th.fair {
        Rating::Fair
    } else {
        Rating::Poor
    })
}

pub fn format_ratio(kind: RatioKind, value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    match kind.unit() {
        Unit::Multiple => format!("{value:.2}"),
        Unit::Percent => format!("{value:.1}%"),
        Unit::Coverage => format!("{value:.1}x"),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedRatio {
    pub key: &'static str,
    pub label: &'static str,
    pub group: RatioGroup,
    pub value: f64,
    pub display: String,
    pub rating: Option<Rating>,
}

pub fn rate_all(metrics: &MetricsResult) -> Vec<RatedRatio> {
    RatioKind::ALL
        .into_iter()
        .map(|kind| {
            let value = metrics.value(kind);
            RatedRatio {
                key: kind.key(),
                label: kind.label(),
                group: kind.group(),
                value,
                display: format_ratio(kind, value),
                rating: rate(kind, value),
            }
        })
        .collect()
}
