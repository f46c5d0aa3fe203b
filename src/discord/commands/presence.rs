// Bot presence. Only Discord SDK types in here.

use poise::serenity_prelude as serenity;

/// Shows "Watching developer briefs" under the bot's name.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("developer briefs | /briefs");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
