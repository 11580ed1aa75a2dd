use std::sync::OnceLock;

use chrono::{Local, NaiveDateTime};
use momo_core::{format_timestamp, whole_units, Category, DatePolicy, TransactionRecord};
use regex::Regex;

use crate::rules::{FieldStrategy, PartyCapture, PartyRole, RuleTable};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// The whole numeric token in front of the marker; it is split into integer
// and fraction afterwards.
re!(re_amount, r"(?i)(?:^|[^0-9.,]|[^0-9][.,])([0-9][0-9.,]*)\s*RWF\b");
// A plain digit run, or thousands grouped by a single separator.
re!(re_amount_integer, r"^(?:[0-9]+|[0-9]{1,3}(?:,[0-9]{3})+|[0-9]{1,3}(?:\.[0-9]{3})+)$");

re!(re_date_iso, r"\b(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\b");
re!(re_date_slash, r"\b(\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2})\b");
re!(re_date_dash, r"\b(\d{2}-\d{2}-\d{4} \d{2}:\d{2}:\d{2})\b");

re!(re_txid_transaction, r"Transaction ID:\s*(\d+)");
re!(re_txid_short, r"TxId:\s*(\d+)");
re!(re_txid_id, r"Id:\s*(\d+)");
re!(re_txid_financial, r"Financial Transaction Id:\s*(\d+)");

re!(re_party_from, r"(?i)\bfrom\s+([A-Za-z ]+)");
re!(re_party_to, r"(?i)\bto\s+([A-Za-z ]+)");
re!(re_party_agent, r"(?i)\bagent:\s*([A-Za-z ]+)");
re!(re_party_by, r"(?i)\bby\s+([A-Za-z ]+)");

re!(re_code, r"(?i)\bto\s+[A-Za-z ]+\s(\d+)\b");
re!(re_phone, r"\((\d+)\)");

/// Words that follow a counterpart name in the templates:
/// `agent: Jane Roe withdrawn ...`.
const NAME_STOP_WORDS: &[&str] = &[
    "withdrawn", "has", "have", "was", "on", "at", "with", "via", "your",
];

/// Date layouts in priority order, with their chrono format.
fn date_layouts() -> [(&'static Regex, &'static str); 3] {
    [
        (re_date_iso(), "%Y-%m-%d %H:%M:%S"),
        (re_date_slash(), "%d/%m/%Y %H:%M:%S"),
        (re_date_dash(), "%d-%m-%Y %H:%M:%S"),
    ]
}

// ── Public extraction API ─────────────────────────────────────────────────────

/// Turns a message body into a candidate [`TransactionRecord`].
///
/// Every field is extracted independently; a pattern that does not match
/// leaves its field empty.
pub struct Extractor<'a> {
    rules: &'a RuleTable,
    date_policy: DatePolicy,
}

impl<'a> Extractor<'a> {
    pub fn new(rules: &'a RuleTable, date_policy: DatePolicy) -> Self {
        Self { rules, date_policy }
    }

    pub fn extract(&self, body: &str, category: Option<Category>) -> TransactionRecord {
        self.extract_at(body, category, Local::now().naive_local())
    }

    /// Like [`Extractor::extract`], with `now` standing in for the
    /// processing time when the date policy synthesizes one.
    pub fn extract_at(
        &self,
        body: &str,
        category: Option<Category>,
        now: NaiveDateTime,
    ) -> TransactionRecord {
        let strategy = category
            .map(|c| self.rules.strategy_for(c))
            .unwrap_or_else(FieldStrategy::fallback);

        let date = parse_date(body).or_else(|| match self.date_policy {
            DatePolicy::Synthesize => Some(format_timestamp(now)),
            DatePolicy::Reject => None,
        });

        let mut record = TransactionRecord {
            amount: parse_amount(body),
            date,
            transaction_id: strategy
                .transaction_id
                .then(|| parse_transaction_id(body))
                .flatten(),
            phone_number: parse_phone(body),
            code: strategy.code.then(|| parse_code(body)).flatten(),
            ..TransactionRecord::new(body, category)
        };

        if let Some(capture) = strategy.party {
            let name = capture_party(body, capture);
            match capture.role() {
                PartyRole::Sender => record.sender = name,
                PartyRole::Receiver => record.receiver = name,
                PartyRole::Agent => record.agent = name,
            }
        }

        record
    }
}

// ── Field parsers ─────────────────────────────────────────────────────────────

/// First amount followed by `RWF`, in whole units.
///
/// A token that cannot be read as a whole (`1234,567`) yields `None`.
pub fn parse_amount(text: &str) -> Option<i64> {
    let token = re_amount().captures(text)?.get(1)?.as_str();
    let (integer, fraction) = split_amount(token)?;
    whole_units(integer, fraction)
}

fn split_amount(token: &str) -> Option<(&str, Option<&str>)> {
    let is_sep = |c: char| c == ',' || c == '.';
    let token = token.trim_end_matches(is_sep);
    if re_amount_integer().is_match(token) {
        return Some((token, None));
    }
    let (integer, fraction) = token.rsplit_once(is_sep)?;
    (fraction.len() <= 2 && re_amount_integer().is_match(integer))
        .then_some((integer, Some(fraction)))
}

/// First date in a supported layout, normalized to `YYYY-MM-DD HH:MM:SS`.
///
/// Layouts are tried in priority order. Only the first match of a layout
/// is considered; if it fails to parse (e.g. month 13) the next layout is
/// tried.
pub fn parse_date(text: &str) -> Option<String> {
    date_layouts().into_iter().find_map(|(re, fmt)| {
        let c = re.captures(text)?;
        NaiveDateTime::parse_from_str(c.get(1)?.as_str(), fmt)
            .ok()
            .map(format_timestamp)
    })
}

pub fn parse_transaction_id(text: &str) -> Option<String> {
    [
        re_txid_transaction(),
        re_txid_short(),
        re_txid_id(),
        re_txid_financial(),
    ]
    .into_iter()
    .find_map(|re| re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

pub fn parse_phone(text: &str) -> Option<String> {
    re_phone()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Merchant code printed after a code holder's name.
pub fn parse_code(text: &str) -> Option<String> {
    re_code()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn capture_party(text: &str, capture: PartyCapture) -> Option<String> {
    let re = match capture {
        PartyCapture::From => re_party_from(),
        PartyCapture::To => re_party_to(),
        PartyCapture::Agent => re_party_agent(),
        PartyCapture::By => re_party_by(),
    };
    let run = re.captures(text)?.get(1)?.as_str();
    clean_name(run)
}

fn clean_name(run: &str) -> Option<String> {
    let words: Vec<&str> = run
        .split_whitespace()
        .take_while(|w| !NAME_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn extract(body: &str) -> TransactionRecord {
        let rules = RuleTable::builtin();
        let category = rules.categorize(body);
        Extractor::new(&rules, DatePolicy::Synthesize).extract_at(body, category, now())
    }

    // ── Amount ────────────────────────────────────────────────────────────────

    #[test]
    fn amount_strips_thousands_commas() {
        assert_eq!(parse_amount("Balance 1,500,000 RWF"), Some(1_500_000));
    }

    #[test]
    fn amount_drops_decimal_fraction() {
        assert_eq!(parse_amount("Fee of 250.00 RWF"), Some(250));
    }

    #[test]
    fn amount_strips_thousands_periods() {
        assert_eq!(parse_amount("received 1.500 RWF"), Some(1_500));
    }

    #[test]
    fn amount_plain_and_case_insensitive() {
        assert_eq!(parse_amount("withdrawn 20000 rwf"), Some(20_000));
        assert_eq!(parse_amount("withdrawn 20000RWF"), Some(20_000));
    }

    #[test]
    fn amount_takes_first_token() {
        assert_eq!(parse_amount("payment of 1,000 RWF. Fee was 100 RWF"), Some(1_000));
    }

    #[test]
    fn amount_requires_currency_marker() {
        assert_eq!(parse_amount("You sent 5000 to Jane"), None);
        assert_eq!(parse_amount("RWF"), None);
    }

    #[test]
    fn amount_keeps_grouping_with_fraction() {
        assert_eq!(parse_amount("paid 1,500.50 RWF"), Some(1_500));
        assert_eq!(parse_amount("*165*S*10000 RWF transferred"), Some(10_000));
        assert_eq!(parse_amount("completed.5000 RWF"), Some(5_000));
    }

    #[test]
    fn amount_malformed_token_is_not_truncated() {
        assert_eq!(parse_amount("sent 1,000,000.000 RWF"), None);
        assert_eq!(parse_amount("sent 1234,567 RWF"), None);
    }

    #[test]
    fn amount_skips_numbers_not_followed_by_marker() {
        assert_eq!(parse_amount("TxId: 7321 payment of 500 RWF"), Some(500));
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    #[test]
    fn date_layouts_normalize_to_iso() {
        for text in [
            "at 2024-03-01 10:00:00.",
            "at 01/03/2024 10:00:00.",
            "at 01-03-2024 10:00:00.",
        ] {
            assert_eq!(parse_date(text).as_deref(), Some("2024-03-01 10:00:00"), "{text}");
        }
    }

    #[test]
    fn date_iso_layout_has_priority() {
        let text = "on 05/06/2023 08:00:00, confirmed 2024-03-01 10:00:00";
        assert_eq!(parse_date(text).as_deref(), Some("2024-03-01 10:00:00"));
    }

    #[test]
    fn date_invalid_match_falls_through() {
        // Month 13 fails to parse; the later valid layout is used.
        let text = "2024-13-01 10:00:00 or 02/03/2024 11:22:33";
        assert_eq!(parse_date(text).as_deref(), Some("2024-03-02 11:22:33"));
    }

    #[test]
    fn date_only_first_match_per_layout() {
        let text = "2024-13-01 10:00:00, 2024-03-01 10:00:00 or 02/03/2024 11:22:33";
        assert_eq!(parse_date(text).as_deref(), Some("2024-03-02 11:22:33"));
    }

    #[test]
    fn date_absent() {
        assert_eq!(parse_date("no date here 2024-03-01"), None);
    }

    #[test]
    fn missing_date_synthesized_from_processing_time() {
        // Permissive default: a date is fabricated rather than rejecting.
        let r = extract("You have received 100 RWF from Jane.");
        assert_eq!(r.date.as_deref(), Some("2026-01-02 03:04:05"));
    }

    #[test]
    fn missing_date_left_empty_under_reject_policy() {
        let rules = RuleTable::builtin();
        let r = Extractor::new(&rules, DatePolicy::Reject).extract_at(
            "You have received 100 RWF from Jane.",
            Some(Category::IncomingMoney),
            now(),
        );
        assert_eq!(r.date, None);
    }

    // ── Transaction id ────────────────────────────────────────────────────────

    #[test]
    fn transaction_id_label_priority() {
        assert_eq!(parse_transaction_id("Transaction ID: 11 TxId: 22").as_deref(), Some("11"));
        assert_eq!(parse_transaction_id("*162*TxId:13913173274*S*").as_deref(), Some("13913173274"));
        assert_eq!(
            parse_transaction_id("Financial Transaction Id: 123456.").as_deref(),
            Some("123456")
        );
        assert_eq!(parse_transaction_id("no id"), None);
    }

    // ── Parties ───────────────────────────────────────────────────────────────

    #[test]
    fn party_name_stops_at_punctuation_and_digits() {
        assert_eq!(
            capture_party("received 5 RWF from John Doe. Financial", PartyCapture::From).as_deref(),
            Some("John Doe")
        );
        assert_eq!(
            capture_party("payment of 10 RWF to Jane Smith 12845", PartyCapture::To).as_deref(),
            Some("Jane Smith")
        );
    }

    #[test]
    fn party_name_stops_at_connective_words() {
        assert_eq!(
            capture_party("via agent: Jane Roe withdrawn 20000 RWF", PartyCapture::Agent).as_deref(),
            Some("Jane Roe")
        );
        assert_eq!(
            capture_party("transaction of 3500 RWF by Data Bundle MTN on your account", PartyCapture::By)
                .as_deref(),
            Some("Data Bundle MTN")
        );
    }

    #[test]
    fn party_name_keeps_inner_short_words() {
        assert_eq!(
            capture_party("received 5 RWF from Bank of Kigali.", PartyCapture::From).as_deref(),
            Some("Bank of Kigali")
        );
        assert_eq!(
            capture_party("payment of 10 RWF to Ministry of Finance and Planning at 2024", PartyCapture::To)
                .as_deref(),
            Some("Ministry of Finance and Planning")
        );
    }

    #[test]
    fn party_absent() {
        assert_eq!(capture_party("payment of 10 RWF", PartyCapture::To), None);
        assert_eq!(capture_party("to (2507)", PartyCapture::To), None);
        assert_eq!(capture_party("from your account", PartyCapture::From), None);
    }

    // ── Whole records ─────────────────────────────────────────────────────────

    #[test]
    fn incoming_money_record() {
        let r = extract("You have received 5,000 RWF from John Doe. Financial Transaction Id: 123456.");
        assert_eq!(r.transaction_type, Some(Category::IncomingMoney));
        assert_eq!(r.amount, Some(5000));
        assert_eq!(r.sender.as_deref(), Some("John Doe"));
        assert_eq!(r.transaction_id.as_deref(), Some("123456"));
        assert_eq!(r.receiver, None);
    }

    #[test]
    fn agent_withdrawal_record() {
        let r = extract("*EN*You have via agent: Jane Roe withdrawn 20000 RWF from your mobile money account.");
        assert_eq!(r.transaction_type, Some(Category::AgentWithdrawal));
        assert_eq!(r.amount, Some(20000));
        assert_eq!(r.agent.as_deref(), Some("Jane Roe"));
        assert_eq!(r.sender, None);
    }

    #[test]
    fn mobile_transfer_record_with_phone() {
        let r = extract(
            "*165*S*10000 RWF transferred to Samuel Carter (250791666666) from 36521838 at 2024-05-11 20:34:47 .",
        );
        assert_eq!(r.transaction_type, Some(Category::MobileTransfer));
        assert_eq!(r.amount, Some(10000));
        assert_eq!(r.receiver.as_deref(), Some("Samuel Carter"));
        assert_eq!(r.phone_number.as_deref(), Some("250791666666"));
        assert_eq!(r.date.as_deref(), Some("2024-05-11 20:34:47"));
    }

    #[test]
    fn code_holder_record_carries_merchant_code() {
        let r = extract(
            "TxId: 73214484437. Your payment of 1,000 RWF to Jane Smith 12845 has been completed at 2024-05-10 16:31:39.",
        );
        assert_eq!(r.transaction_type, Some(Category::CodeHolderPayment));
        assert_eq!(r.receiver.as_deref(), Some("Jane Smith"));
        assert_eq!(r.code.as_deref(), Some("12845"));
        assert_eq!(r.transaction_id.as_deref(), Some("73214484437"));
    }

    #[test]
    fn third_party_record() {
        let r = extract(
            "*164*S*Y'ello,A transaction of 3500 RWF by Data Bundle MTN on your MOMO account was successfully completed at 2024-05-12 13:09:21.",
        );
        assert_eq!(r.transaction_type, Some(Category::ThirdPartyTransaction));
        assert_eq!(r.sender.as_deref(), Some("Data Bundle MTN"));
    }

    #[test]
    fn bank_deposit_has_no_party() {
        let r = extract("*113*R*A bank deposit of 40000 RWF has been added to your mobile money account at 2024-05-11 18:43:49.");
        assert_eq!(r.transaction_type, Some(Category::BankDeposit));
        assert_eq!(r.amount, Some(40000));
        assert_eq!((r.sender, r.receiver, r.agent), (None, None, None));
    }

    #[test]
    fn uncategorized_body_keeps_independent_fields() {
        let r = extract("Reminder (0788123456): balance 300 RWF");
        assert_eq!(r.transaction_type, None);
        assert_eq!(r.amount, Some(300));
        assert_eq!(r.phone_number.as_deref(), Some("0788123456"));
        assert_eq!(r.sender, None);
    }

    #[test]
    fn body_is_preserved_verbatim() {
        let body = "  You have received 5 RWF from A.  ";
        let r = extract(body);
        assert_eq!(r.message, body);
        assert_eq!(r.raw_body, body);
    }

    #[test]
    fn no_panic_on_garbage_input() {
        let _ = extract("!@#$%^&*()\n\0\x01\x02 RWF ((())) agent: by to from");
    }
}
