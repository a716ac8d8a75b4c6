use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use std::sync::{Mutex, PoisonError};

use exam_core::model::{Question, QuestionPool};

/// Questions drawn for one exam.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    pub questions: Vec<Question>,
    pub requested: usize,
    pub pool_size: usize,
}

impl SamplePlan {
    /// Number of questions drawn.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// True when the pool could not fill the requested size.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.questions.len() < self.requested
    }
}

/// Uniform sampling without replacement over a question pool.
///
/// The RNG is owned by the sampler, so a seeded sampler yields the same
/// sequence of draws across runs.
#[derive(Debug)]
pub struct QuestionSampler {
    rng: Mutex<StdRng>,
}

impl QuestionSampler {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Draw `min(size, pool.len())` distinct questions, keeping the drawn order.
    pub fn sample(&self, pool: &QuestionPool, size: usize) -> SamplePlan {
        let available = pool.questions();
        let amount = size.min(available.len());

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let questions = index::sample(&mut *rng, available.len(), amount)
            .into_iter()
            .map(|i| available[i].clone())
            .collect();

        SamplePlan {
            questions,
            requested: size,
            pool_size: available.len(),
        }
    }
}

impl Default for QuestionSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{CourseId, QuestionDraft, QuestionId};
    use std::collections::HashSet;

    fn pool(n: u64) -> QuestionPool {
        let questions = (1..=n)
            .map(|id| {
                QuestionDraft {
                    course_id: CourseId::new(1),
                    year: 2022,
                    prompt: format!("Q{id}"),
                    options: vec![("a".into(), "A".into()), ("b".into(), "B".into())],
                    correct: "a".into(),
                    explanation: None,
                }
                .validate(QuestionId::new(id))
                .unwrap()
            })
            .collect();
        QuestionPool::new(questions).unwrap()
    }

    #[test]
    fn draws_unique_questions_up_to_size() {
        let sampler = QuestionSampler::seeded(7);
        let plan = sampler.sample(&pool(50), 20);

        assert_eq!(plan.total(), 20);
        assert!(!plan.is_short());
        let ids: HashSet<_> = plan.questions.iter().map(Question::id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn small_pool_is_fully_drawn() {
        let sampler = QuestionSampler::seeded(7);
        let source = pool(10);
        let plan = sampler.sample(&source, 20);

        assert_eq!(plan.total(), 10);
        assert!(plan.is_short());
        assert_eq!(plan.pool_size, 10);
        assert!(plan.questions.iter().all(|q| source.contains(q.id())));
    }

    #[test]
    fn same_seed_same_draw() {
        let source = pool(40);
        let a = QuestionSampler::seeded(42).sample(&source, 5);
        let b = QuestionSampler::seeded(42).sample(&source, 5);
        assert_eq!(a, b);
    }
}
