//! Plain text the bot sends. Kept together so wording stays consistent.

use crate::models::item::{Item, Rarity};
use crate::models::session::SpawnSession;
use crate::models::totals::{GroupTotal, UserTotal};
use crate::models::types::UserId;
use crate::services::WinReceipt;

const RARITY_BADGES: [(Rarity, &str); 4] = [
    (Rarity::Common, "⚪"),
    (Rarity::Rare, "🔵"),
    (Rarity::Epic, "🟣"),
    (Rarity::Legendary, "🟡"),
];

fn badge(rarity: Rarity) -> &'static str {
    RARITY_BADGES
        .iter()
        .find(|(r, _)| *r == rarity)
        .map(|(_, b)| *b)
        .unwrap_or("")
}

fn who(user: UserId, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("user {user}"),
    }
}

pub fn spawn_caption(item: &Item) -> String {
    format!(
        "{} A new {} character appeared!\nSend their name (or /guess <name>) to catch them.",
        badge(item.rarity),
        item.rarity
    )
}

pub fn winner(receipt: &WinReceipt) -> String {
    format!(
        "{} caught {} ({}) {} {}!\n+{} coins, balance {}. You now have {} of them.",
        who(receipt.user, receipt.user_name.as_deref()),
        receipt.item.name,
        receipt.item.series,
        badge(receipt.item.rarity),
        receipt.item.rarity,
        receipt.reward,
        receipt.balance,
        receipt.count
    )
}

pub fn no_winner(session: &SpawnSession) -> String {
    format!(
        "Nobody caught them. It was {} ({}).",
        session.item.name, session.item.series
    )
}

pub fn miss() -> &'static str {
    "Nope, that's not them."
}

pub fn no_active_spawn() -> &'static str {
    "There is nothing to catch right now."
}

pub fn try_again() -> &'static str {
    "Something went wrong, please try again in a moment."
}

pub fn welcome() -> &'static str {
    "Welcome to the character catcher!\nAdd me to a group: every now and then a character shows up, and the first one to name it keeps it.\nSend /help for the list of commands."
}

pub fn help_text(is_admin: bool) -> String {
    let mut text = String::from(
        r#"Commands
  /guess <name>           Catch the current character (also /catch, /grab)
  /balance                Show your coins
  /inventory              Show your collection (also /harem, /collection)
  /pay <user_id> <amount> Give coins to someone
  /top                    Top collectors
  /ctop                   Top collectors in this chat
  /ping                   Check the bot is alive"#,
    );

    if is_admin {
        text.push_str(
            r#"

Admin
  /spawn [name]                           Spawn now (random, or by name)
  /set-interval <minutes>                 Time between spawns
  /upload <media> <name> <series> <rarity> Add a character (use _ for spaces)
  /reload                                 Re-read the configuration"#,
        );
    }
    text
}

pub fn leaderboard_global(rows: &[UserTotal]) -> String {
    if rows.is_empty() {
        return "Nobody has caught anything yet.".into();
    }
    let mut out = String::from("Top collectors\n");
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {}\n",
            i + 1,
            who(row.user, row.display_name.as_deref()),
            row.total_caught
        ));
    }
    out.trim_end().to_string()
}

pub fn leaderboard_group(rows: &[GroupTotal]) -> String {
    if rows.is_empty() {
        return "Nobody in this chat has caught anything yet.".into();
    }
    let mut out = String::from("Top collectors in this chat\n");
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {}\n",
            i + 1,
            who(row.user, row.display_name.as_deref()),
            row.total_caught
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::NewItem;
    use crate::models::types::{ChatId, SessionId};

    #[test]
    fn winner_mentions_item_and_reward() {
        let item = NewItem {
            name: "Asuka_Langley".into(),
            series: "Evangelion".into(),
            rarity: Rarity::Epic,
            media: "file-id".into(),
        }
        .into_item();
        let receipt = WinReceipt {
            session: SessionId::new(),
            chat: ChatId(-1),
            item,
            user: UserId(42),
            user_name: None,
            reward: 50,
            balance: 150,
            count: 2,
        };

        let text = winner(&receipt);
        assert!(text.starts_with("user 42 caught Asuka Langley (Evangelion)"));
        assert!(text.contains("+50 coins, balance 150"));
    }

    #[test]
    fn admin_help_is_longer() {
        assert!(help_text(true).contains("/upload"));
        assert!(!help_text(false).contains("/upload"));
    }
}
