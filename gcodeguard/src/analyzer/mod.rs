pub mod anomalies;
pub mod metrics;
pub mod recommendations;
pub mod statistics;
pub mod toolpath;
pub mod validator;

pub use anomalies::{Anomaly, AnomalyDetector, AnomalyKind, AnomalyReport, AnomalySeverity};
pub use metrics::{DetailedMetrics, ExtrusionMode, FilamentParameters, MetricsCalculator, PrintMetrics};
pub use recommendations::{Priority, Recommendation, RecommendationGenerator, RecommendationReport, Topic};
pub use statistics::Statistics;
pub use toolpath::{Position, PositionTracker, ResolvedMove, Toolpath};
pub use validator::{Issue, RuleContext, Severity, ValidationReport, ValidationRule, Validator};
