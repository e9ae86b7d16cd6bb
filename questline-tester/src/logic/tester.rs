use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub boss_victories: u32,
    pub boss_encounters: u32,
    pub average_final_level: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_plan(
        &self,
        plan: &SimulationPlan,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing strategy: {} (seed: {seed}, events: {})",
                    plan.strategy.label().bright_white(),
                    plan.max_events
                );
            }

            results.push(self.run_single_seed(plan, seed, iterations));
        }

        results
    }

    fn run_single_seed(&self, plan: &SimulationPlan, seed: u64, iterations: usize) -> ScenarioResult {
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut successes = 0;
        let mut boss_victories = 0;
        let mut boss_encounters = 0;
        let mut level_total = 0_u64;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = self.tester.run_plan(plan, iteration_seed);
            let duration = start_time.elapsed();

            boss_victories += summary.victories;
            boss_encounters += summary.encounters;
            level_total += u64::from(summary.final_state.level);

            if summary.passed() {
                successes += 1;
                performance_data.push(duration);
                if self.tester.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) level:{} boss:{}/{}",
                        i + 1,
                        iterations,
                        summary.final_state.level,
                        summary.victories,
                        summary.encounters
                    );
                }
            } else {
                let failure = describe_failure(i + 1, &summary);
                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        failure.clone().red()
                    );
                }
                failures.push(failure);
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_final_level = if iterations == 0 {
            0.0
        } else {
            level_total as f64 / iterations as f64
        };

        ScenarioResult {
            scenario_name: plan.strategy.label().to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            boss_victories,
            boss_encounters,
            average_final_level,
            average_duration,
            performance_data,
        }
    }
}

fn describe_failure(iteration: usize, summary: &SimulationSummary) -> String {
    let state = &summary.final_state;
    format!(
        "Iteration {iteration} (strategy {}, seed {}, events {}, level {}, HP {}/{}, boss {}/{}): {} | {}",
        summary.strategy.label(),
        summary.seed,
        summary.events,
        state.level,
        state.health,
        state.max_health,
        summary.final_boss.current_health,
        summary.final_boss.max_health,
        summary.violations.join("; "),
        summarize_decision_path(summary)
    )
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    if summary.decision_log.is_empty() {
        return "no decisions recorded".to_string();
    }

    summary
        .decision_log
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            let rationale = entry
                .rationale
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("-");
            format!(
                "event {}: {} -> {} [{}] idx {} reason {}",
                entry.event_count,
                entry.event_name,
                entry.choice_label,
                entry.policy_name,
                entry.choice_index,
                rationale
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis_vec.into_iter().map(Duration::from_millis).collect())
    }
}
