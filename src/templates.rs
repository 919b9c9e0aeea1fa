//! Static output templates used when no AI generator is configured.

use crate::dialogue::Category;

/// Fixed text block for one category
#[derive(Debug)]
pub struct Template {
    pub heading: &'static str,
    pub intro: &'static str,
    pub sample: &'static str,
}

static POST: Template = Template {
    heading: "📢 Новый пост по вашему запросу:",
    intro: "Вот пример текста для поста:",
    sample: r#""Друзья, у нас потрясающие новости! 🎉

Мы открываем двери нового фитнес-клуба [Название] в самом сердце города! 💪

✨ Просторные залы с современным оборудованием
✨ Профессиональные тренеры с индивидуальным подходом
✨ Зоны для функционального тренинга, йоги и кроссфита
✨ Удобное расположение и приятная атмосфера

Специально для новых клиентов - скидка 30% на первый месяц!

Записывайтесь прямо сейчас и сделайте первый шаг к своей лучшей версии! 🚀

#фитнес #здоровье #спорт #тренировки #[город]""#,
};

static REVIEW: Template = Template {
    heading: "📝 Отзыв по вашему запросу:",
    intro: "Вот пример отзыва:",
    sample: r#""Пользуюсь новым iPhone уже две недели и хочу поделиться впечатлениями.

👍 Плюсы:
- Потрясающий экран с яркими цветами
- Молниеносная работа системы
- Отличная камера, особенно ночные снимки
- Приятный дизайн и удобный размер

👎 Минусы:
- Батарея могла бы быть лучше при активном использовании
- Быстро нагревается при играх или длительной съемке

В целом - отличный телефон, но есть небольшие недочеты. Рекомендую, если вы готовы к некоторым компромиссам.""#,
};

static AD_COPY: Template = Template {
    heading: "✍️ Рекламный текст по вашему запросу:",
    intro: "Вот пример текста:",
    sample: r#""Хотите освоить Python и начать карьеру в IT? 🐍

Наш курс Python Pro - это:

✅ Практика с первого занятия
✅ Реальные проекты в портфолио
✅ Поддержка менторов 24/7
✅ Гарантия трудоустройства или возврат денег

За 3 месяца вы:
- Научитесь писать чистый и эффективный код
- Освоите популярные фреймворки
- Разработаете 5 реальных проектов
- Подготовитесь к собеседованиям

Не упустите шанс изменить свою жизнь! Записывайтесь на бесплатный пробный урок по ссылке ниже.

#Python #Программирование #IT #Курсы #Карьера""#,
};

pub fn template(category: Category) -> &'static Template {
    match category {
        Category::Post => &POST,
        Category::Review => &REVIEW,
        Category::AdCopy => &AD_COPY,
    }
}

/// Render the category template with the brief spliced in verbatim
pub fn render(category: Category, brief: &str) -> String {
    let template = template(category);
    format!(
        "{}\n\n{}\n\n🔹 {}\n\n{}",
        template.heading, brief, template.intro, template.sample
    )
}

/// Render the revision block for a brief and the requested edits
pub fn render_revision(brief: &str, edit_notes: &str) -> String {
    format!(
        "Вот текст с учетом ваших правок:\n\n{brief}\n\n(Здесь был бы текст с изменениями: {edit_notes})"
    )
}
