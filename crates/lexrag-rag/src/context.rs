//! Prompt texts and context assembly for the answer generator.

use lexrag_core::types::SearchResult;

pub const BLOCK_SEPARATOR: &str = "\n---\n";

/// Rough characters-per-token ratio used to turn a token budget into chars.
pub const CHARS_PER_TOKEN: usize = 4;

pub const NO_CONTEXT: &str = "Nincs releváns kontextus találva a dokumentumokban.";

pub const SYSTEM_PROMPT: &str = "Te egy magyar jogi asszisztens vagy, aki magyar és román nyelvű jogi dokumentumrészleteket elemez, és mindig magyarul válaszol.
FONTOS SZABÁLYOK:
1. Mindig MAGYARUL válaszolj.
2. Kizárólag a megadott kontextusra támaszkodj. Ha a kontextus nem elegendő, jelezd, hogy nincs elég információ.
3. Idézz közvetlenül a kontextusból annak EREDETI nyelvén. Ha az idézet román nyelvű, mellékelj rövid magyar értelmezést/fordítást. Ha az idézet magyar, ne erőltesd román idézetet.
4. Hivatkozz a forrásokra (pl. dokumentumnév; ha lehet: cikk/oldal).
5. Legyél tömör, pontos és közérthető; a jogi szakkifejezéseket röviden magyarázd el.
Feladat: Elemezd a rendelkezésre álló szövegrészleteket, és adj pontos, forrásolt választ magyarul a felhasználó kérdésére a kontextus alapján.";

pub const TRANSLATE_PROMPT: &str =
    "Egy fordító vagy. Fordítsd le a felhasználó magyar üzenetét román nyelvre. Csak a román fordítást add vissza.";

pub const TRANSLATE_MAX_TOKENS: u32 = 512;

fn source_block(result: &SearchResult) -> String {
    let record = &result.record;
    let pages = match (record.page_start, record.page_end) {
        (Some(start), Some(end)) if start != end => format!("; oldalak: {start}–{end}"),
        (Some(start), _) => format!("; oldal: {start}"),
        _ => String::new(),
    };
    format!("[Forrás: {}{}]\n{}\n", record.document_name, pages, record.text)
}

/// Join the source blocks of `chunks` in order, never exceeding
/// `token_budget * 4` characters including separators. The block that would
/// overflow is cut to the remaining allowance and nothing follows it.
pub fn assemble_context(chunks: &[SearchResult], token_budget: usize) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }
    let budget = token_budget * CHARS_PER_TOKEN;
    let sep_len = BLOCK_SEPARATOR.chars().count();
    let mut used = 0;
    let mut parts: Vec<String> = Vec::new();
    for chunk in chunks {
        let sep = if parts.is_empty() { 0 } else { sep_len };
        let block = source_block(chunk);
        let len = block.chars().count();
        if used + sep + len > budget {
            let remaining = budget.saturating_sub(used + sep);
            if remaining > 0 {
                parts.push(block.chars().take(remaining).collect());
            }
            break;
        }
        used += sep + len;
        parts.push(block);
    }
    parts.join(BLOCK_SEPARATOR)
}

pub fn user_prompt(question: &str, context: &str) -> String {
    format!(
        "
FELHASZNÁLÓ KÉRDÉSE:
\"{question}\"

RELEVÁNS DOKUMENTUMRÉSZLETEK (eredeti nyelven):
---
{context}
---

UTASÍTÁSOK:
- Mindig magyarul válaszolj.
- Az idézeteket a kontextus EREDETI nyelvén add meg. Ha román idézet szerepel, tegyél mellé rövid magyar értelmezést/fordítást. Ha magyar az idézet, ne erőltesd román idézetet.
- Ha a kontextus nem elegendő, jelezd egyértelműen.
"
    )
}
