//! Prompt builders for the three completion tasks.
//!
//! Each builder renders retrieved evidence plus the analysis context into a
//! `(system, user)` instruction pair. The declared JSON schemas are a hard
//! contract: the parser in `contract.rs` depends on the model being told to
//! emit nothing but the object.

use std::fmt::Write;

use bizlens_common::{is_home_org, AnalysisRequest, DocumentChunk, NewsItem, HOME_ORG};

/// Character budget for the concatenated document block.
pub const DOC_CHAR_BUDGET: usize = 20_000;

pub const NEWS_SYSTEM: &str = "한국어로만 작성. 반드시 JSON만 출력.";
pub const SUMMARY_SYSTEM: &str = "한국어로 작성. 중복 제거, 핵심만 간결하게.";

pub const NEWS_PSWOT_SCHEMA: &str = r#"{
  "PEST": {"P": ["문장1~2"], "E": ["문장1~2"], "S": ["문장1~2"], "T": ["문장1~2"]},
  "SWOT": {"S": ["문장1~2"], "W": ["문장1~2"], "O": ["문장1~2"], "T": ["문장1~2"]},
  "one_liner": "자사 한 줄 대응전략 + KPI 2~3개 예시"
}"#;

pub const COMBINED_SCHEMA: &str = r#"{
  "internal_summary": ["문장(끝에 [D#])", "문장(끝에 [D#])"],
  "strengths": ["문장(끝에 [D#])", "문장(끝에 [D#])"],
  "weaknesses": ["문장(끝에 [D#])", "문장(끝에 [D#])"],
  "external_insights": ["문장(끝에 [N#])", "문장(끝에 [N#])"],
  "proposals": {
    "benchmarking": ["문장(근거 [D#]/[N#])", "문장(근거 [D#]/[N#])"],
    "cooperation": ["문장(근거 [D#]/[N#])", "문장(근거 [D#]/[N#])"],
    "differentiation": ["문장(근거 [D#]/[N#])", "문장(근거 [D#]/[N#])"],
    "execution_kpis": ["문장(자사 KPI)", "문장(자사 KPI)"]
  }
}"#;

/// One system + user instruction pair for the completion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePair {
    pub system: String,
    pub user: String,
}

/// News-only PEST/SWOT analysis prompt.
///
/// The persona rules resolve the self-reference ambiguity: when the subject
/// company is the home organization (or no company is given), the model is
/// put in first-person mode and forbidden from treating the home
/// organization as a benchmark or competitor. Getting this branch wrong
/// inverts every strength/weakness label downstream.
pub fn news_analysis_messages(request: &AnalysisRequest, news: &[NewsItem]) -> MessagePair {
    let user = format!(
        "당신은 전략/기획 전문가입니다. 아래 정보와 뉴스 근거를 기반으로 \
         PEST / SWOT 4사분면용 요약(각 칸 1~2문장)을 JSON으로 작성하세요.\n\
         {persona}\n\n\
         JSON 스키마:\n{schema}\n\n\
         제약:\n\
         - 각 리스트 최대 2문장, 문장 끝 마침표.\n\
         - 필요 시 문장 끝에 (출처:[1]) 허용.\n\
         - JSON 외 텍스트 금지.\n\n\
         컨텍스트:\n{context}\n\n=== 뉴스 근거 ===\n{news_block}",
        persona = persona_rules(&request.company),
        schema = NEWS_PSWOT_SCHEMA,
        context = context_block(request),
        news_block = news_block(news, ""),
    );
    MessagePair {
        system: NEWS_SYSTEM.to_string(),
        user,
    }
}

/// Document summarization prompt over the budget-capped chunk block.
pub fn document_summary_messages(chunks: &[DocumentChunk], max_chars: usize) -> MessagePair {
    let merged = assemble_document_block(chunks, max_chars);
    MessagePair {
        system: SUMMARY_SYSTEM.to_string(),
        user: format!(
            "아래 여러 문서 조각을 3~4줄로 한글 요약하세요. 불필요한 수식어/중복은 제거:\n\n{merged}"
        ),
    }
}

/// Combined news + internal-document insight prompt. News evidence is tagged
/// `[N#]`, document evidence `[D#]`, and the model may cite nothing else.
pub fn combined_insight_messages(
    news: &[NewsItem],
    chunks: &[DocumentChunk],
    request: &AnalysisRequest,
) -> MessagePair {
    let subject = if request.company.trim().is_empty() {
        "자사"
    } else {
        request.company.trim()
    };

    let mut doc_block = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let _ = write!(
            doc_block,
            "[D{}] {} - {}\n내용:\n{}\n\n",
            i + 1,
            title_or_placeholder(&chunk.title),
            chunk.source,
            chunk.content,
        );
    }

    let user = format!(
        "아래 외부 뉴스(N#)와 내부 문서(D#)를 바탕으로 자사({subject}) 관점의 간결한 \
         인사이트를 JSON으로만 출력.\n\n\
         JSON 스키마:\n{schema}\n\n\
         제약:\n- JSON 외 텍스트 금지.\n- 각 항목 1문장, 배열 최대 2개.\n- [N#]/[D#]만 인용.\n\n\
         맥락:\n회사(A): {subject}\n기술: {techs}\n도메인: {domains}\n\n\
         === 외부 뉴스 ===\n{news_block}=== 내부 문서 ===\n{doc_block}",
        schema = COMBINED_SCHEMA,
        techs = joined_or_na(&request.technologies),
        domains = joined_or_na(&request.domains),
        news_block = news_block(news, "N"),
    );
    MessagePair {
        system: NEWS_SYSTEM.to_string(),
        user,
    }
}

/// Concatenate `[D#]`-labelled chunks up to the character budget. The chunk
/// that crosses the boundary is truncated to fill the budget exactly rather
/// than dropped.
pub fn assemble_document_block(chunks: &[DocumentChunk], max_chars: usize) -> String {
    let mut block = String::new();
    let mut total = 0usize;
    for (i, chunk) in chunks.iter().enumerate() {
        let piece = format!(
            "[D{}] {}\n{}\n\n",
            i + 1,
            title_or_placeholder(&chunk.title),
            chunk.content
        );
        let piece_chars = piece.chars().count();
        if total + piece_chars > max_chars {
            let remain = max_chars - total;
            if remain > 0 {
                block.extend(piece.chars().take(remain));
            }
            break;
        }
        block.push_str(&piece);
        total += piece_chars;
    }
    block
}

/// Render the enumerated, 1-indexed news evidence block. `tag_prefix` is
/// empty for the news-only prompt and "N" for the combined prompt.
fn news_block(news: &[NewsItem], tag_prefix: &str) -> String {
    let mut block = String::new();
    for (i, item) in news.iter().enumerate() {
        let _ = write!(
            block,
            "[{}{}] {} — {} — {}\n요약: {}\nURL: {}\n\n",
            tag_prefix,
            i + 1,
            title_or_placeholder(&item.title),
            item.provider,
            item.published_at,
            item.snippet,
            item.url,
        );
    }
    block
}

fn persona_rules(company: &str) -> String {
    if is_home_org(company) {
        format!(
            "- 자사는 '{HOME_ORG}'로 정의. 뉴스에 등장하는 '{HOME_ORG}'는 곧 자사.\n\
             - '{HOME_ORG}'를 경쟁사로 취급 금지. '자사 대비 {HOME_ORG}' 같은 표현 금지.\n\
             - 벤치마킹/비교 대상은 '{HOME_ORG}'가 아님(경쟁사 또는 개별 타사명으로 표기).\n\
             - 시점은 현재, 어조는 내부 전략 보고서 톤."
        )
    } else {
        format!(
            "- 자사는 '{HOME_ORG}'. 분석 대상 회사는 '{company}'.\n\
             - '자사'는 항상 '{HOME_ORG}'를 의미. '{HOME_ORG}'와 '{company}' 혼동 금지.\n\
             - 출력은 자사 관점(= {HOME_ORG})에서 '{company}'를 평가."
        )
    }
}

fn context_block(request: &AnalysisRequest) -> String {
    let mut lines = Vec::new();
    if !request.company.is_empty() {
        lines.push(format!("회사: {}", request.company));
    }
    lines.push(format!("기술: {}", joined_or_na(&request.technologies)));
    lines.push(format!("도메인: {}", joined_or_na(&request.domains)));
    lines.join("\n")
}

fn joined_or_na(values: &[String]) -> String {
    if values.is_empty() {
        "N/A".to_string()
    } else {
        values.join(", ")
    }
}

fn title_or_placeholder(title: &str) -> &str {
    if title.trim().is_empty() {
        "(제목 없음)"
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_item(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            snippet: "요약 내용".to_string(),
            url: "https://news.example.com/1".to_string(),
            published_at: "2025-11-02T09:00:00Z".to_string(),
            provider: "Naver News".to_string(),
        }
    }

    fn chunk(content: &str) -> DocumentChunk {
        DocumentChunk {
            title: "제안서.pdf".to_string(),
            content: content.to_string(),
            source: "https://blob/docs/제안서.pdf".to_string(),
        }
    }

    #[test]
    fn home_org_alias_switches_to_first_person() {
        let request = AnalysisRequest {
            company: "케이티디에스".to_string(),
            technologies: vec!["AI".to_string()],
            domains: vec!["금융".to_string()],
        };
        let messages = news_analysis_messages(&request, &[news_item("뉴스")]);
        assert!(messages.user.contains("경쟁사로 취급 금지"));
        assert!(!messages.user.contains("분석 대상 회사"));
    }

    #[test]
    fn other_company_gets_third_person_naming_both() {
        let request = AnalysisRequest {
            company: "삼성SDS".to_string(),
            technologies: vec![],
            domains: vec![],
        };
        let messages = news_analysis_messages(&request, &[news_item("뉴스")]);
        assert!(messages.user.contains("분석 대상 회사는 '삼성SDS'"));
        assert!(messages.user.contains(HOME_ORG));
        assert!(messages.user.contains("기술: N/A"));
    }

    #[test]
    fn empty_company_defaults_to_first_person() {
        let request = AnalysisRequest::default();
        let messages = news_analysis_messages(&request, &[]);
        assert!(messages.user.contains("경쟁사로 취급 금지"));
        assert!(!messages.user.contains("회사: "));
    }

    #[test]
    fn news_block_is_one_indexed() {
        let request = AnalysisRequest::default();
        let messages = news_analysis_messages(&request, &[news_item("첫째"), news_item("둘째")]);
        assert!(messages.user.contains("[1] 첫째"));
        assert!(messages.user.contains("[2] 둘째"));
    }

    #[test]
    fn combined_prompt_tags_both_evidence_kinds() {
        let request = AnalysisRequest {
            company: "삼성SDS".to_string(),
            technologies: vec!["RAG".to_string()],
            domains: vec![],
        };
        let messages =
            combined_insight_messages(&[news_item("뉴스")], &[chunk("본문")], &request);
        assert!(messages.user.contains("[N1] 뉴스"));
        assert!(messages.user.contains("[D1] 제안서.pdf"));
        assert!(messages.user.contains("회사(A): 삼성SDS"));
        assert_eq!(messages.system, NEWS_SYSTEM);
    }

    #[test]
    fn combined_prompt_defaults_subject_when_no_company() {
        let messages =
            combined_insight_messages(&[news_item("뉴스")], &[chunk("본문")], &Default::default());
        assert!(messages.user.contains("회사(A): 자사"));
    }

    #[test]
    fn document_block_truncates_final_chunk_to_budget() {
        let first = chunk(&"가".repeat(40));
        let second = chunk(&"나".repeat(100));
        let header_chars = "[D1] 제안서.pdf\n\n\n".chars().count();
        let first_chars = header_chars + 40;

        // budget crosses inside the second chunk
        let budget = first_chars + 30;
        let block = assemble_document_block(&[first, second], budget);
        assert_eq!(block.chars().count(), budget);
        assert!(block.contains("[D2]"));
    }

    #[test]
    fn document_block_within_budget_is_untouched() {
        let chunks = vec![chunk("짧은 본문")];
        let block = assemble_document_block(&chunks, DOC_CHAR_BUDGET);
        assert!(block.starts_with("[D1] 제안서.pdf\n"));
        assert!(block.ends_with("\n\n"));
    }

    #[test]
    fn zero_remaining_budget_drops_chunk_entirely() {
        let chunks = vec![chunk(&"가".repeat(50)), chunk("나")];
        let first_len = assemble_document_block(&chunks[..1], 10_000).chars().count();
        let block = assemble_document_block(&chunks, first_len);
        assert_eq!(block.chars().count(), first_len);
        assert!(!block.contains("[D2]"));
    }
}
