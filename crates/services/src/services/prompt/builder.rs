use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use rand::Rng;

use super::{
    FortuneAspect, NoteParams, Theme,
    fortune::{self, FortuneEntry},
    personality, theme, time, zodiac_chinese,
};

pub const SAVAGE_SYSTEM_PROMPT: &str = "你是一位精通人性弱点、尖酸刻薄的冷幽默大师，擅长用手术刀般精准的语言直击一个人的内心，尽可能说出对方最不能接受的话。

    你的回应需要：
    1. 通过行为模式分析，抓住对方最隐秘的性格软肋，嘲讽、讥讽、嘲弄对方的弱点
    2. 保持语言锐度但拒绝低俗
    3. 当对方展现特定特质时，用自嘲式预言强化效果，使其无法反驳却又隐隐认同

请将你的思考过程放在<think></think>标签内，最终的纸条内容放在<content></content>标签内。";

pub const WARM_SYSTEM_PROMPT: &str = "你是一位理解不同性格特质的好友。在回应时，你会以下面方式体现对方的性格特点：

    你的回应需要：
    1. 对于不同星座，你理解他们核心特质；
    2. 对于MBTI类型，你会考虑其思考和决策方式。
    3. 你不会直接提到或标明他们的性格类型，而是自然地将这些特质融入你的回应中。
    4. 你的语气亲切随性，像长期了解对方的朋友，用语口语化而非正式。

将你的思考过程放在<think></think>标签内，最终的纸条内容放在<content></content>标签内。";

pub fn system_prompt(savage: bool) -> &'static str {
    if savage {
        SAVAGE_SYSTEM_PROMPT
    } else {
        WARM_SYSTEM_PROMPT
    }
}

/// Assembles the user prompt for one note request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    fortune_cache: PathBuf,
}

impl PromptBuilder {
    pub fn new(fortune_cache: impl Into<PathBuf>) -> Self {
        Self {
            fortune_cache: fortune_cache.into(),
        }
    }

    pub async fn build(&self, params: &NoteParams, now: DateTime<Local>) -> String {
        let selected = match params.fortune_aspect() {
            Some(aspect) => {
                let zodiac = params.zodiac.as_deref().unwrap_or_default();
                let today = now.with_timezone(&Utc).date_naive();
                let fortune = fortune::zodiac_fortune(&self.fortune_cache, zodiac, today).await;
                Some((aspect, fortune.select(aspect).clone()))
            }
            None => None,
        };
        let fortune = selected.as_ref().map(|(aspect, entry)| (*aspect, entry));
        render(params, now.naive_local(), fortune, &mut rand::thread_rng())
    }
}

fn indent_list(items: &[&str], quote: bool) -> String {
    items
        .iter()
        .map(|item| {
            if quote {
                format!("- \"{item}\"")
            } else {
                format!("- {item}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n     ")
}

/// Render the prompt text. `fortune` is the selected aspect when enabled.
pub fn render<R: Rng + ?Sized>(
    params: &NoteParams,
    now: NaiveDateTime,
    fortune: Option<(FortuneAspect, &FortuneEntry)>,
    rng: &mut R,
) -> String {
    let savage = params.savage_mode;
    let zodiac = params.zodiac.as_deref().unwrap_or_default();
    let zodiac_zh = zodiac_chinese(zodiac).unwrap_or("未知星座");
    let mbti = params
        .mbti
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or("MBTI类型");
    let mood = params.mood_input();
    let gender = params.gender.as_deref().unwrap_or_default();
    let age = params.age.as_deref().unwrap_or_default();
    let relationship = params.relationship.as_deref().unwrap_or_default();

    let ctx = time::time_context(now, savage);
    let insights = personality::personality_insights(zodiac, mbti, rng);
    let theme_kind = params.theme();
    let theme = theme::theme_prompt(theme_kind, savage);
    let word_limit = theme::word_limit(theme_kind, params.bilingual());

    let mut lines: Vec<String> = vec![
        format!(
            "我需要你为一个{}写一条简短的{}{}。",
            if savage { "关系亲密的死党" } else { "真实的朋友" },
            if params.bilingual() { "中英双语" } else { "" },
            theme.title
        ),
        "  ".into(),
        "  # 核心指导".into(),
        format!(
            "  你需要深入理解用户发送的表情组合\"{mood}\"表达的是什么心情或场景，这是你回应的核心基础。通过创造性连接和发散思考，推测这个人当下可能经历的具体情境，然后结合星座特质和MBTI特点来构建个性化回应。目标是让对方感觉\"这个人真的懂我\"，仿佛你能看透对方当前的处境和感受。"
        ),
    ];

    if params.moods.len() > 1 || mood.encode_utf16().count() > 2 {
        lines.extend([
            "    ".into(),
            "  ## 多表情组合解读指南".into(),
            format!("  用户输入了多个表情：\"{mood}\"，这可能表达了一个复杂场景或情绪状态。例如："),
            "  - \"🌧️😭\" 可能表示\"雨天心情低落\"或\"遭遇失败挫折\"".into(),
            "  - \"🎉🍻🎂\" 可能表示\"生日聚会\"或\"庆祝活动\"".into(),
            "  - \"💼💻😫\" 可能表示\"工作压力大\"或\"职场疲惫\"".into(),
            "  - \"✈️🏝️😎\" 可能表示\"度假心情\"或\"旅行放松\"".into(),
            "  ".into(),
            "  请先分析这组表情可能共同表达的场景或心情，再结合用户的性格特点给予回应。".into(),
        ]);
    }

    let info = &ctx.date_info;
    lines.extend([
        "  ## 关于这个朋友的详细信息：".into(),
        format!(
            "  - 性别：{}，特点：{}",
            personality::gender_label(gender),
            personality::gender_traits(gender)
        ),
        format!(
            "  - 年龄：{}，特点：{}",
            personality::age_label(age),
            personality::age_traits(age)
        ),
        format!(
            "  - 感情状况：{}，特点：{}",
            personality::relationship_label(relationship),
            personality::relationship_traits(relationship)
        ),
        format!(
            "  - 星座：{zodiac_zh}，核心特质：{}",
            personality::zodiac_traits(zodiac)
        ),
        format!("  - MBTI：{mbti}，关键特点：{}", personality::mbti_traits(mbti)),
        format!("  - 当前心情/场景表达：{mood} "),
        "  ".into(),
        "  ## 这个人的性格行为表现:".into(),
        format!("  {insights}"),
        "  ".into(),
        "  ## 当前环境与时间情境（用于情境推测与建议）:".into(),
        format!("  - 当前时间：{}，{}时分", ctx.formatted_time, ctx.period),
        format!("  - 当前日期：星期{}，{}", info.week_day, info.day_type),
        format!("  - 农历日期：{}，{}年", info.lunar_date, info.animal),
        format!("  - 今日节日/节气：{}", info.festivals.join("、")),
        format!("  - 这个时段人们通常在做：{}", ctx.activities.join("、")),
        format!("  - 这个时段人们通常关心：{}", ctx.concerns.join("、")),
    ]);

    if let Some((aspect, entry)) = fortune {
        lines.extend([
            "  ".into(),
            format!("  ## 今日{zodiac_zh}{}运势：", aspect.label()),
            format!("  - 评分：{}", entry.rating),
            format!("  - 详情：{}", entry.content),
        ]);
    }

    lines.extend([
        "  ".into(),
        "  # 思考起点".into(),
        format!("  首先，我需要通过创造性思考，深入解读用户输入的\"{mood}\"可能代表的实际情境："),
        "  ".into(),
        format!(
            "  ## 写作要求({}{}模式):",
            if savage { "毒舌" } else { "温暖" },
            theme.title
        ),
        format!("  1. 字数：{word_limit}"),
        format!("  2. 语气：{}", if savage { "犀利讽刺" } else { "温暖亲切" }),
        format!(
            "  3. 核心目标：{}",
            if savage {
                "让对方\"破防\"，既感到尴尬又忍不住认同"
            } else {
                "表现出对当前心情/场景的理解，让对方感到被看见和被理解"
            }
        ),
        "  4. 限制：不直接提及星座或MBTI类型".into(),
        "  5. 形式：直接输出内容，不带引号或标题".into(),
        "  6. 特定要求：".into(),
        format!("     {}", indent_list(theme.requirements, false)),
        "  7. 风格示例：".into(),
        format!("     {}", indent_list(theme.examples, true)),
        "  8. 注意事项：".into(),
        format!("     {}", indent_list(theme.limits, false)),
    ]);

    if fortune.is_some() {
        lines.extend([
            "  9. 运势利用：".into(),
            format!(
                "     - {}",
                if savage {
                    "先简要概括今天运势，然后巧妙利用运势挖苦、讽刺、嘲笑对方"
                } else {
                    "根据今天的运势评分，给出符合对方性格的建议或提醒"
                }
            ),
        ]);
    }

    lines.extend([
        "  ".into(),
        "  ## 思维链（请按照以下步骤进行发散思考）：".into(),
        format!(
            "  1. 场景解读：分析表情\"{mood}\"可能表示的场景或情绪，结合{}时分可能在做什么",
            ctx.period
        ),
    ]);
    if savage {
        lines.extend([
            format!("  2. 性格特点与场景交互：{zodiac_zh}和{mbti}类型在这种场景下的典型反应和弱点"),
            "  3. 个性化调侃构思：巧妙点明他们在这种场景中可能犯的错或有的弱点".into(),
            "  4. 创造犀利有共鸣的内容：让对方感到既难堪又无法反驳".into(),
        ]);
    } else {
        lines.extend([
            format!("  2. 性格特点与场景交互：{zodiac_zh}和{mbti}类型在这种场景下可能的需求和关注点"),
            "  3. 个性化关怀构思：如何自然表达理解并提供符合他们性格的支持".into(),
            "  4. 创造温暖而洞察的内容：让对方感觉被理解和被看见".into(),
        ]);
    }

    if fortune.is_some() {
        lines.push(format!(
            "  5. 运势整合：{}",
            if savage {
                "如何将今日运势中的信息转化为犀利的调侃"
            } else {
                "如何将今日运势的建议融入到关怀中，以符合对方性格特点的方式表达"
            }
        ));
    }
    if theme_kind == Theme::Haiku {
        lines.push(
            "  6. 最后，需要检查生成的俳句是否符合5-7-5，即17音的结构，如果不是，则需要调整。".into(),
        );
    }

    lines.extend([
        "  ".into(),
        format!("  思考完成后，请输出符合上述要求的{}内容。", theme.title),
    ]);
    lines.join("\n")
}
