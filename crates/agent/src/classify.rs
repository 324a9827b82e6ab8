//! Topic and intent classification.
//!
//! Classification is plain substring matching over fixed vocabularies. Topic
//! rules are checked in order and the first rule with any matching term wins,
//! so a question mentioning both heart and cancer terms resolves to heart.

use medassist_core::Topic;
use serde::{Deserialize, Serialize};

/// Vocabulary that marks a question as asking about the data itself.
pub const DATA_TERMS: [&str; 10] = [
    "data",
    "statistic",
    "analysis",
    "dataset",
    "record",
    "patient",
    "cases",
    "average",
    "count",
    "sum",
];

const HEART_TERMS: [&str; 4] = ["heart", "cardiac", "cholesterol", "blood pressure"];
const CANCER_TERMS: [&str; 4] = ["cancer", "tumor", "malignant", "benign"];
const DIABETES_TERMS: [&str; 3] = ["diabetes", "glucose", "insulin"];

/// What the user wants from the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// Answer by querying a topic's dataset
    DataLookup,
    /// Answer from web knowledge
    GeneralKnowledge,
}

/// Classification of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub topic: Option<Topic>,
    pub intent: Intent,
}

impl Route {
    /// The topic whose dataset should be queried, if this is a data lookup.
    pub fn dataset(&self) -> Option<Topic> {
        match self.intent {
            Intent::DataLookup => self.topic,
            Intent::GeneralKnowledge => None,
        }
    }
}

/// One row of the topic rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRule {
    pub topic: Topic,
    pub terms: Vec<String>,
}

impl TopicRule {
    pub fn new(topic: Topic, terms: &[&str]) -> Self {
        Self {
            topic,
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }
}

/// Keyword classifier: an ordered topic rule table plus a data vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rules: Vec<TopicRule>,
    data_terms: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            vec![
                TopicRule::new(Topic::Heart, &HEART_TERMS),
                TopicRule::new(Topic::Cancer, &CANCER_TERMS),
                TopicRule::new(Topic::Diabetes, &DIABETES_TERMS),
            ],
            &DATA_TERMS,
        )
    }
}

impl Classifier {
    /// Build a classifier. `rules` order is the tie-break priority.
    pub fn new(rules: Vec<TopicRule>, data_terms: &[&str]) -> Self {
        Self {
            rules,
            data_terms: data_terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn rules(&self) -> &[TopicRule] {
        &self.rules
    }

    /// First topic whose rule matches, in rule order.
    pub fn topic(&self, question: &str) -> Option<Topic> {
        let lowered = question.to_lowercase();
        self.topic_of_lowered(&lowered)
    }

    /// Whether the question uses any data vocabulary.
    pub fn mentions_data(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        self.mentions_data_lowered(&lowered)
    }

    /// Classify topic and intent.
    pub fn classify(&self, question: &str) -> Route {
        let lowered = question.to_lowercase();
        let topic = self.topic_of_lowered(&lowered);

        let intent = if topic.is_some() && self.mentions_data_lowered(&lowered) {
            Intent::DataLookup
        } else {
            Intent::GeneralKnowledge
        };

        Route { topic, intent }
    }

    fn topic_of_lowered(&self, lowered: &str) -> Option<Topic> {
        self.rules
            .iter()
            .find(|rule| rule.matches(lowered))
            .map(|rule| rule.topic)
    }

    fn mentions_data_lowered(&self, lowered: &str) -> bool {
        self.data_terms
            .iter()
            .any(|term| lowered.contains(term.as_str()))
    }
}
