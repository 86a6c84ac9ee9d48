//! Operator-facing wording and the input tokens the wizard recognises

pub const GREETING: &str = "Привет! Я соберу данные и пришлю готовый отчёт сообщением.\n\n\
Команды:\n\
/new_report — создать отчёт\n\
/cancel — отменить ввод";

pub const ACCESS_DENIED: &str = "Доступ ограничен. Обратитесь к администратору.";

pub const CANCELLED: &str = "Окей, всё отменил. Чтобы начать заново — набери /new_report";

pub const NOT_SENT: &str = "Окей, отчёт не отправлен. Чтобы начать заново — набери /new_report";

pub const ASK_TITLE: &str = "Название проекта или недели (например: <i>Кинопоиск — мемы</i>):";

pub const ASK_PERIOD: &str = "Период (например: <i>14–20 октября</i>):";

pub const ASK_PAID_LINKS: &str = "Ссылки на вышедшие публикации (каждая с новой строки).\n\
Можно так: <b>Название — https://...</b> или просто ссылкой.";

pub const ASK_PLANNED_REACH: &str = "Планируемый охват (число, можно с пробелами):";

pub const ASK_ACTUAL_REACH: &str = "Фактический охват (число, можно с пробелами):";

pub const ASK_MEDIAPLAN: &str = "Ссылка на медиаплан (Google Sheets). Если нет — отправь “-”.";

pub const ASK_ORGANIC_LINKS: &str = "Органические (виральные) ссылки — просто <b>URL постов</b>, по одной в строке.\n\
Мы оставим их как есть, без преобразования в названия каналов. Если нет — отправь “-”.";

pub const ASK_ORGANIC_REACH: &str =
    "Суммарный органический охват (число, можно с пробелами). Если органики нет — отправь 0:";

pub const ASK_SCREENSHOTS: &str = "Пришли <b>скриншоты</b> (можно несколькими сообщениями) \
или ссылку на папку со скринами (Google Drive/Диск/Облако).\n\
Если скринов нет — напиши «готово».";

pub const ASK_MORE_SCREENSHOTS: &str =
    "Принял. Пришли ещё скриншоты или напиши «готово», когда закончишь.";

pub const ASK_CONFIRM: &str = "Всё собрал. Отправить отчёт? (<b>да</b> / <b>нет</b>)";

pub const NOT_A_NUMBER_PLANNED: &str = "Не похоже на число. Введи, например: <b>1233500</b>";

pub const NOT_A_NUMBER_ACTUAL: &str = "Не похоже на число. Введи, например: <b>1571600</b>";

pub const NOT_A_NUMBER_ORGANIC: &str = "Не похоже на число. Введи, например: <b>50000</b>";

/// "Nothing to add" answers for optional steps
const SKIP_TOKENS: &[&str] = &["-", "—", "–", "нет", "no"];

/// Ends screenshot collection
const DONE_TOKENS: &[&str] = &["готово", "done", "всё", "все", "хватит", "стоп", "stop"];

const YES_TOKENS: &[&str] = &["да", "д", "yes", "y", "ок", "ok", "ага", "отправить", "отправляй", "+"];

const NO_TOKENS: &[&str] = &["нет", "н", "no", "n", "не надо", "отмена", "-"];

fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase()
}

fn is_one_of(text: &str, tokens: &[&str]) -> bool {
    let normalized = normalize(text);
    tokens.contains(&normalized.as_str())
}

pub fn is_skip(text: &str) -> bool {
    is_one_of(text, SKIP_TOKENS)
}

pub fn is_done(text: &str) -> bool {
    is_one_of(text, DONE_TOKENS)
}

/// Operator's answer at the confirmation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
}

impl Decision {
    pub fn parse(text: &str) -> Option<Self> {
        if is_one_of(text, YES_TOKENS) {
            Some(Decision::Yes)
        } else if is_one_of(text, NO_TOKENS) {
            Some(Decision::No)
        } else {
            None
        }
    }
}
