use std::path::Path;

use momo_core::Category;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount token inside a categorization pattern. Loose on purpose; the
/// extractor does the strict parse.
const AMOUNT: &str = r"\d[\d,.]*";

/// Keyword that introduces a counterpart name, and the field it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyCapture {
    /// `from <name>` → sender
    From,
    /// `to <name>` → receiver
    To,
    /// `agent: <name>` → agent
    Agent,
    /// `by <name>` → sender
    By,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Sender,
    Receiver,
    Agent,
}

impl PartyCapture {
    pub fn role(self) -> PartyRole {
        match self {
            PartyCapture::From | PartyCapture::By => PartyRole::Sender,
            PartyCapture::To => PartyRole::Receiver,
            PartyCapture::Agent => PartyRole::Agent,
        }
    }
}

impl std::str::FromStr for PartyCapture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "from" => Ok(PartyCapture::From),
            "to" => Ok(PartyCapture::To),
            "agent" => Ok(PartyCapture::Agent),
            "by" => Ok(PartyCapture::By),
            other => Err(format!("Unknown party capture: '{other}'")),
        }
    }
}

/// Which optional fields the extractor pulls for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldStrategy {
    pub party: Option<PartyCapture>,
    pub transaction_id: bool,
    pub code: bool,
}

impl FieldStrategy {
    pub fn for_category(category: Category) -> Self {
        let party = match category {
            Category::IncomingMoney => Some(PartyCapture::From),
            Category::CodeHolderPayment
            | Category::MobileTransfer
            | Category::AirtimeBill
            | Category::CashPowerBill => Some(PartyCapture::To),
            Category::AgentWithdrawal => Some(PartyCapture::Agent),
            Category::ThirdPartyTransaction => Some(PartyCapture::By),
            Category::BankDeposit | Category::BankTransfer | Category::BundlePurchase => None,
        };
        FieldStrategy {
            party,
            transaction_id: true,
            code: category == Category::CodeHolderPayment,
        }
    }

    /// Category-independent fields only.
    pub fn fallback() -> Self {
        FieldStrategy {
            party: None,
            transaction_id: true,
            code: false,
        }
    }
}

/// One row of the rule table. Strategy fields left unset fall back to the
/// category's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub category: Category,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<PartyCapture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<bool>,
}

impl ExtractionRule {
    pub fn new(category: Category, pattern: impl Into<String>) -> Self {
        ExtractionRule {
            category,
            pattern: pattern.into(),
            party: None,
            transaction_id: None,
            code: None,
        }
    }

    pub fn strategy(&self) -> FieldStrategy {
        let defaults = FieldStrategy::for_category(self.category);
        FieldStrategy {
            party: self.party.or(defaults.party),
            transaction_id: self.transaction_id.unwrap_or(defaults.transaction_id),
            code: self.code.unwrap_or(defaults.code),
        }
    }
}

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid pattern for '{category}': {source}")]
    InvalidPattern {
        category: Category,
        source: regex::Error,
    },
    #[error("Rule table is empty")]
    Empty,
}

/// Matches one message template for categorization.
struct CompiledRule {
    rule: ExtractionRule,
    regex: Regex,
}

/// Ordered rule table. The first rule whose pattern matches decides the
/// category; later rules are never consulted.
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

#[derive(Deserialize)]
struct RuleFile {
    rules: Vec<ExtractionRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<ExtractionRule>) -> Result<Self, RuleError> {
        if rules.is_empty() {
            return Err(RuleError::Empty);
        }
        let rules = rules
            .into_iter()
            .map(|rule| -> Result<CompiledRule, RuleError> {
                let regex = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RuleError::InvalidPattern {
                        category: rule.category,
                        source,
                    })?;
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The built-in table for MTN MoMo notification templates.
    pub fn builtin() -> Self {
        Self::new(default_rules()).expect("built-in rule patterns are valid")
    }

    /// Parse `[[rules]]` entries, keeping file order as match order.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        Self::new(file.rules)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn find_matching_rule(&self, body: &str) -> Option<&ExtractionRule> {
        let lower = body.to_lowercase();
        self.rules
            .iter()
            .find(|cr| cr.regex.is_match(&lower))
            .map(|cr| &cr.rule)
    }

    pub fn categorize(&self, body: &str) -> Option<Category> {
        self.find_matching_rule(body).map(|r| r.category)
    }

    /// Strategy of the first rule for `category`, or the category default
    /// when the table has no rule for it.
    pub fn strategy_for(&self, category: Category) -> FieldStrategy {
        self.rules
            .iter()
            .find(|cr| cr.rule.category == category)
            .map(|cr| cr.rule.strategy())
            .unwrap_or_else(|| FieldStrategy::for_category(category))
    }

    pub fn rules(&self) -> impl Iterator<Item = &ExtractionRule> {
        self.rules.iter().map(|cr| &cr.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn default_rules() -> Vec<ExtractionRule> {
    vec![
        ExtractionRule::new(Category::IncomingMoney, format!(r"received {AMOUNT}\s*rwf from")),
        ExtractionRule::new(
            Category::CodeHolderPayment,
            format!(r"payment of {AMOUNT}\s*rwf to [a-z ]+ \d+"),
        ),
        ExtractionRule::new(
            Category::MobileTransfer,
            format!(r"{AMOUNT}\s*rwf transferred to [a-z ]+ \(\d+\)"),
        ),
        ExtractionRule::new(Category::BankDeposit, format!(r"bank deposit of {AMOUNT}\s*rwf")),
        ExtractionRule::new(
            Category::AirtimeBill,
            format!(r"payment of {AMOUNT}\s*rwf to airtime"),
        ),
        ExtractionRule::new(
            Category::CashPowerBill,
            format!(r"payment of {AMOUNT}\s*rwf to cash power"),
        ),
        ExtractionRule::new(
            Category::ThirdPartyTransaction,
            format!(r"transaction of {AMOUNT}\s*rwf by [a-z ]+"),
        ),
        ExtractionRule::new(Category::AgentWithdrawal, format!(r"withdrawn {AMOUNT}\s*rwf")),
        ExtractionRule::new(Category::BankTransfer, r"external transaction id"),
        ExtractionRule::new(Category::BundlePurchase, r"purchased an internet bundle"),
    ]
}
