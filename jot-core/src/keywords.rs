//! Keyword tables for first-match text classification.
//!
//! Every table is scanned in declared order and the first entry contained in
//! the (lowercased) text wins. Order is part of the behavior: reordering an
//! entry changes results for texts that contain more than one keyword.
//! English phrases sit next to their Chinese equivalents at the same position.

use crate::importance::Importance;

/// Phrase → day offset from today.
///
/// "day after tomorrow" and "下下周" deliberately lose to the shorter entries
/// declared before them.
pub const DATE_OFFSETS: &[(&str, i64)] = &[
    ("today", 0),
    ("今天", 0),
    ("tomorrow", 1),
    ("明天", 1),
    ("day after tomorrow", 2),
    ("后天", 2),
    ("in three days", 3),
    ("大后天", 3),
    ("next week", 7),
    ("下周", 7),
    ("week after next", 14),
    ("下下周", 14),
    ("next month", 30),
    ("下个月", 30),
];

/// Phrase → seed priority for extraction.
pub const PRIORITY_KEYWORDS: &[(&str, u8)] = &[
    ("urgent", 1),
    ("immediately", 1),
    ("asap", 1),
    ("right away", 1),
    ("high priority", 1),
    ("紧急", 1),
    ("立刻", 1),
    ("马上", 1),
    ("尽快", 1),
    ("高优先级", 1),
    ("important", 2),
    ("prioritize", 2),
    ("重要", 2),
    ("优先", 2),
    ("normal", 3),
    ("regular", 3),
    ("ordinary", 3),
    ("普通", 3),
    ("一般", 3),
    ("正常", 3),
    ("no rush", 4),
    ("when free", 4),
    ("low priority", 4),
    ("不急", 4),
    ("有空", 4),
    ("低优先级", 4),
    ("anytime", 5),
    ("whenever", 5),
    ("no deadline", 5),
    ("随便", 5),
    ("任意", 5),
    ("无限制", 5),
];

/// Any of these marks a task completed. Checked before [`IN_PROGRESS_KEYWORDS`].
pub const COMPLETED_KEYWORDS: &[&str] = &[
    "done",
    "finished",
    "completed",
    "完成",
    "做了",
    "搞定",
];

pub const IN_PROGRESS_KEYWORDS: &[&str] = &[
    "in progress",
    "working on",
    "ongoing",
    "进行",
    "正在",
    "处理中",
];

/// Forces a recommended priority of 1.
pub const URGENT_KEYWORDS: &[&str] = &[
    "urgent",
    "immediately",
    "asap",
    "right away",
    "must",
    "today",
    "deadline",
    "important meeting",
    "紧急",
    "立刻",
    "马上",
    "尽快",
    "必须",
    "今天",
    "立即",
    "重要会议",
    "截止",
];

/// Tightens a recommended priority to at most 2.
pub const IMPORTANT_KEYWORDS: &[&str] = &[
    "important",
    "prioritize",
    "crucial",
    "essential",
    "meeting",
    "presentation",
    "demo",
    "report",
    "重要",
    "优先",
    "关键",
    "主要",
    "核心",
    "会议",
    "演示",
    "汇报",
];

/// Loosens an already-relaxed recommended priority by one step.
pub const LOW_PRIORITY_KEYWORDS: &[&str] = &[
    "when free",
    "no rush",
    "later",
    "someday",
    "spare time",
    "whenever",
    "有空",
    "不急",
    "以后",
    "改天",
    "空闲",
    "随意",
    "随便",
];

/// Importance buckets, scanned bucket by bucket in this order.
pub const IMPORTANCE_BUCKETS: &[(Importance, &[&str])] = &[
    (
        Importance::Critical,
        &[
            "critical",
            "crucial",
            "must",
            "urgent",
            "important meeting",
            "deadline",
            "关键",
            "核心",
            "必须",
            "紧急",
            "重要会议",
        ],
    ),
    (
        Importance::High,
        &[
            "important",
            "prioritize",
            "essential",
            "meeting",
            "presentation",
            "report",
            "重要",
            "优先",
            "主要",
            "会议",
            "演示",
            "汇报",
        ],
    ),
    (
        Importance::Medium,
        &["routine", "regular", "normal", "daily", "常规", "普通", "一般", "日常"],
    ),
    (
        Importance::Low,
        &[
            "when free",
            "no rush",
            "casual",
            "leisure",
            "for fun",
            "有空",
            "不急",
            "随意",
            "休闲",
            "娱乐",
        ],
    ),
];

/// Narrower sets used only for explanation clauses.
pub const REASON_URGENT: &[&str] = &[
    "urgent",
    "immediately",
    "asap",
    "right away",
    "紧急",
    "立刻",
    "马上",
    "尽快",
];
pub const REASON_IMPORTANT: &[&str] = &["important", "prioritize", "crucial", "重要", "优先", "关键"];
pub const REASON_LOW: &[&str] = &["when free", "no rush", "later", "有空", "不急", "以后"];

/// Whether `haystack` mentions `keyword`.
///
/// ASCII keywords must sit on word boundaries ("must" does not match
/// "mustard"). Other keywords are plain substrings, since CJK text has no
/// spaces between words.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return haystack.contains(keyword);
    }
    haystack.match_indices(keyword).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + keyword.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// First keyword of `table` contained in `haystack`.
pub fn first_match<'a>(haystack: &str, table: &[&'a str]) -> Option<&'a str> {
    table
        .iter()
        .copied()
        .find(|kw| contains_keyword(haystack, kw))
}

/// Value of the first `(keyword, value)` entry contained in `haystack`.
pub fn first_value<T: Copy>(haystack: &str, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(kw, _)| contains_keyword(haystack, kw))
        .map(|(_, v)| *v)
}
