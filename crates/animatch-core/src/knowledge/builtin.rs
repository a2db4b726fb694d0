//! Sample knowledge dataset.

use crate::types::CharacterRecord;

const CRUNCHYROLL: &str = "Crunchyroll";
const NETFLIX: &str = "Netflix";

/// Records for the characters animatch knows out of the box.
pub fn builtin_records() -> Vec<CharacterRecord> {
    vec![
        CharacterRecord::new(
            "Naruto Uzumaki",
            "Naruto",
            "A young ninja with dreams of becoming Hokage. Known for his orange jumpsuit, \
             whisker marks, and never-give-up attitude. Hosts the Nine-Tailed Fox spirit.",
        )
        .with_related(["Sasuke Uchiha", "Sakura Haruno", "Kakashi Hatake", "Jiraiya"])
        .with_appearances(["Naruto", "Naruto Shippuden", "Boruto: Naruto Next Generations"])
        .with_platform(CRUNCHYROLL, "https://www.crunchyroll.com/series/GY9PJ5KWR/naruto")
        .with_platform(NETFLIX, "https://www.netflix.com/title/70205012"),
        CharacterRecord::new(
            "Sasuke Uchiha",
            "Naruto",
            "Last surviving member of the Uchiha clan, seeking revenge for his family. \
             A prodigy ninja with the Sharingan eye technique.",
        )
        .with_related(["Naruto Uzumaki", "Itachi Uchiha", "Sakura Haruno", "Kakashi Hatake"])
        .with_appearances(["Naruto", "Naruto Shippuden", "Boruto: Naruto Next Generations"])
        .with_platform(CRUNCHYROLL, "https://www.crunchyroll.com/series/GY9PJ5KWR/naruto")
        .with_platform(NETFLIX, "https://www.netflix.com/title/70205012"),
        CharacterRecord::new(
            "Monkey D. Luffy",
            "One Piece",
            "Captain of the Straw Hat Pirates with the power to stretch like rubber. \
             Dreams of becoming the Pirate King and finding the legendary One Piece treasure.",
        )
        .with_related(["Roronoa Zoro", "Nami", "Sanji", "Tony Tony Chopper"])
        .with_appearances(["One Piece"])
        .with_platform(CRUNCHYROLL, "https://www.crunchyroll.com/series/GRMG8ZQZR/one-piece")
        .with_platform(NETFLIX, "https://www.netflix.com/title/80217863"),
        CharacterRecord::new(
            "Roronoa Zoro",
            "One Piece",
            "Swordsman of the Straw Hat Pirates who uses three-sword style. \
             Dreams of becoming the world's greatest swordsman.",
        )
        .with_related(["Monkey D. Luffy", "Sanji", "Dracule Mihawk", "Nami"])
        .with_appearances(["One Piece"])
        .with_platform(CRUNCHYROLL, "https://www.crunchyroll.com/series/GRMG8ZQZR/one-piece")
        .with_platform(NETFLIX, "https://www.netflix.com/title/80217863"),
        CharacterRecord::new(
            "Son Goku",
            "Dragon Ball",
            "A Saiyan raised on Earth who becomes its greatest defender. Known for his spiky \
             black hair, orange gi, and incredible fighting abilities including Super Saiyan \
             transformations.",
        )
        .with_related(["Vegeta", "Gohan", "Piccolo", "Krillin"])
        .with_appearances(["Dragon Ball", "Dragon Ball Z", "Dragon Ball Super"])
        .with_platform(
            CRUNCHYROLL,
            "https://www.crunchyroll.com/series/GR19V7816/dragon-ball-super",
        )
        .with_platform("Funimation", "https://www.funimation.com/shows/dragon-ball-z/"),
        CharacterRecord::new(
            "Vegeta",
            "Dragon Ball",
            "Prince of the Saiyans and rival-turned-ally of Goku. Proud warrior with incredible \
             power, constantly striving to surpass Goku.",
        )
        .with_related(["Son Goku", "Trunks", "Bulma", "Gohan"])
        .with_appearances(["Dragon Ball Z", "Dragon Ball Super"])
        .with_platform(
            CRUNCHYROLL,
            "https://www.crunchyroll.com/series/GR19V7816/dragon-ball-super",
        )
        .with_platform("Funimation", "https://www.funimation.com/shows/dragon-ball-z/"),
        CharacterRecord::new(
            "Eren Yeager",
            "Attack on Titan",
            "A young man who seeks freedom and revenge against the Titans that destroyed his \
             home. Possesses the power of the Attack Titan.",
        )
        .with_related(["Mikasa Ackerman", "Armin Arlert", "Levi Ackerman", "Reiner Braun"])
        .with_appearances(["Attack on Titan"])
        .with_platform(
            CRUNCHYROLL,
            "https://www.crunchyroll.com/series/GR751KNZY/attack-on-titan",
        )
        .with_platform(
            "Hulu",
            "https://www.hulu.com/series/attack-on-titan-9c91ffa3-dc20-48bf-8bc5-692e37c76d88",
        ),
        CharacterRecord::new(
            "Levi Ackerman",
            "Attack on Titan",
            "Humanity's strongest soldier, captain of the Survey Corps Special Operations Squad. \
             Known for his incredible combat skills and cleanliness obsession.",
        )
        .with_related(["Eren Yeager", "Mikasa Ackerman", "Erwin Smith", "Hange Zoë"])
        .with_appearances(["Attack on Titan"])
        .with_platform(
            CRUNCHYROLL,
            "https://www.crunchyroll.com/series/GR751KNZY/attack-on-titan",
        )
        .with_platform(
            "Hulu",
            "https://www.hulu.com/series/attack-on-titan-9c91ffa3-dc20-48bf-8bc5-692e37c76d88",
        ),
    ]
}
