//! Closed category tables of the national grants registry.
//!
//! Lexical tables (regions, administration levels) map literal names to IDs.
//! Semantic tables map a canonical description to IDs; the description is what
//! gets embedded, so it is written to read like the queries it should attract.

use crate::filters::AdministrationType;

/// One row of a semantic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub description: &'static str,
    pub ids: &'static [u32],
}

/// A named semantic table.
#[derive(Debug, Clone, Copy)]
pub struct Taxonomy {
    pub name: &'static str,
    pub entries: &'static [TaxonomyEntry],
}

impl Taxonomy {
    pub fn descriptions(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.description.to_string())
            .collect()
    }
}

const fn entry(description: &'static str, ids: &'static [u32]) -> TaxonomyEntry {
    TaxonomyEntry { description, ids }
}

pub const REGIONS: &[(&str, u32)] = &[
    ("a coruña", 4),
    ("lugo", 5),
    ("ourense", 6),
    ("pontevedra", 7),
    ("galicia", 3),
    ("asturias", 9),
    ("principado de asturias", 8),
    ("cantabria", 10),
    ("noroeste", 2),
    ("araba/álava", 14),
    ("gipuzkoa", 15),
    ("bizkaia", 16),
    ("pais vasco", 13),
    ("navarra", 18),
    ("comunidad foral de navarra", 17),
    ("la rioja", 19),
    ("huesca", 22),
    ("teruel", 23),
    ("zaragoza", 24),
    ("aragon", 21),
    ("noreste", 12),
    ("madrid", 27),
    ("comunidad de madrid", 26),
    ("centro (es)", 28),
    ("ávila", 30),
    ("burgos", 31),
    ("león", 32),
    ("palencia", 33),
    ("salamanca", 34),
    ("segovia", 35),
    ("soria", 36),
    ("valladolid", 37),
    ("zamora", 38),
    ("castilla y leon", 29),
    ("albacete", 40),
    ("ciudad real", 41),
    ("cuenca", 42),
    ("guadalajara", 43),
    ("toledo", 44),
    ("castilla la mancha", 39),
    ("badajoz", 46),
    ("cáceres", 47),
    ("extremadura", 45),
    ("barcelona", 50),
    ("girona", 51),
    ("lleida", 52),
    ("tarragona", 53),
    ("cataluña", 49),
    ("alicante", 55),
    ("castellón", 56),
    ("valencia", 57),
    ("comunidad valenciana", 54),
    ("eivissa y formentera", 59),
    ("mallorca", 60),
    ("menorca", 61),
    ("illes balears", 58),
    ("este", 48),
    ("almería", 64),
    ("cádiz", 65),
    ("córdoba", 66),
    ("granada", 67),
    ("huelva", 68),
    ("jaén", 69),
    ("málaga", 70),
    ("sevilla", 71),
    ("andalucia", 63),
    ("murcia", 73),
    ("region de murcia", 72),
    ("ceuta", 75),
    ("ciudad autonoma de ceuta", 74),
    ("melilla", 77),
    ("ciudad autonoma de melilla", 76),
    ("sur", 62),
    ("el hierro", 80),
    ("fuerteventura", 81),
    ("gran canaria", 82),
    ("la gomera", 83),
    ("la palma", 84),
    ("lanzarote", 85),
    ("tenerife", 86),
    ("canarias", 79),
    ("españa", 1),
    ("extra-regio nuts 1", 87),
];

/// Checked in order; the first keyword contained in the query decides.
pub const ADMINISTRATION_KEYWORDS: &[(&str, AdministrationType)] = &[
    ("estatal", AdministrationType::Central),
    ("estado", AdministrationType::Central),
    ("central", AdministrationType::Central),
    ("gobierno", AdministrationType::Central),
    ("ministerio", AdministrationType::Central),
    ("autonómica", AdministrationType::Autonomous),
    ("autonomica", AdministrationType::Autonomous),
    ("comunidad autónoma", AdministrationType::Autonomous),
    ("comunidad autonoma", AdministrationType::Autonomous),
    ("local", AdministrationType::Local),
    ("ayuntamiento", AdministrationType::Local),
    ("municipio", AdministrationType::Local),
    ("diputación", AdministrationType::Local),
    ("diputacion", AdministrationType::Local),
    ("otros", AdministrationType::Other),
    ("otras", AdministrationType::Other),
    ("otro", AdministrationType::Other),
    ("organismo", AdministrationType::Other),
];

pub const RECOVERY_FUND_KEYWORDS: &[&str] =
    &["mrr", "recuperación", "resiliencia", "next generation"];

pub const BENEFICIARIES: Taxonomy = Taxonomy {
    name: "beneficiary",
    entries: &[
        entry("Esta categoría incluye a personas físicas que no desarrollan ninguna actividad económica. Engloba a particulares, ciudadanos en general, individuos, estudiantes, jubilados, desempleados, familias y hogares que buscan ayudas o beneficios.", &[1]),
        entry("Esta categoría se refiere a personas jurídicas que no persiguen un fin de lucro o no realizan una actividad económica lucrativa. Incluye a asociaciones, fundaciones, organizaciones sin ánimo de lucro (ONGs), clubes deportivos, federaciones, confederaciones, partidos políticos y colegios profesionales.", &[2]),
        entry("Engloba a Pequeñas y Medianas Empresas (PYMES) y a personas físicas (autónomos) que sí desarrollan una actividad económica. Aquí se incluyen autónomos, profesionales independientes, emprendedores, pequeños negocios, microempresas, sociedades limitadas (SL) y start-ups.", &[3]),
        entry("Esta categoría está dirigida a grandes empresas, corporaciones, multinacionales y otras entidades de gran envergadura o tamaño económico. Son organizaciones con una gran capacidad productiva y un número elevado de empleados.", &[4]),
    ],
};

pub const ACTIVITIES: Taxonomy = Taxonomy {
    name: "activity",
    entries: &[
        entry("Sector primario que incluye la producción agrícola, la cría de animales (ganadería), el cultivo y aprovechamiento de bosques (silvicultura), y la captura de peces y otros recursos acuáticos.", &[274]),
        entry("Actividades relacionadas con la extracción de minerales sólidos, líquidos y gaseosos de la Tierra, como la minería de carbón, petróleo, gas natural o metales.", &[278]),
        entry("Transformación de materiales o sustancias en nuevos productos, ya sea en fábricas o plantas. Incluye la fabricación de alimentos, textiles, maquinaria, productos químicos, electrónicos, etc.", &[284]),
        entry("Producción, transporte y distribución de electricidad, gas natural, vapor y sistemas de aire acondicionado para consumo doméstico, comercial e industrial.", &[309]),
        entry("Gestión del ciclo integral del agua (captación, tratamiento y suministro), recolección y tratamiento de aguas residuales, gestión de residuos (recogida, tratamiento, eliminación) y actividades de descontaminación ambiental.", &[311]),
        entry("Edificación de todo tipo (residencial y no residencial), ingeniería civil (carreteras, puentes, etc.) y trabajos especializados de construcción.", &[316]),
        entry("Comercialización de bienes a otros negocios (mayor) o directamente a consumidores (menor), así como el mantenimiento y reparación de vehículos de motor y motocicletas.", &[320]),
        entry("Servicios de transporte de pasajeros y mercancías por vía terrestre, marítima, aérea y espacial, además del almacenamiento de bienes.", &[324]),
        entry("Actividades de alojamiento (hoteles, campings) y servicios de comida y bebida (restaurantes, bares, cafeterías).", &[330]),
        entry("Producción y distribución de productos y servicios de información y comunicación. Incluye edición, cine, radio, televisión, telecomunicaciones y programación informática.", &[333]),
        entry("Servicios financieros como banca, seguros, fondos de inversión, y otras operaciones monetarias y crediticias.", &[340]),
        entry("Actividades relacionadas con la compra, venta, alquiler y gestión de propiedades inmobiliarias.", &[344]),
        entry("Servicios especializados que requieren un alto grado de conocimiento o habilidad, como consultoría, servicios jurídicos, contabilidad, arquitectura, ingeniería, investigación y desarrollo.", &[346]),
        entry("Servicios de apoyo a las empresas y a la actividad profesional, como alquiler de vehículos, gestión de empleo, seguridad, limpieza de edificios, y servicios de oficina.", &[354]),
        entry("Actividades propias del gobierno, la administración de justicia, la seguridad pública, la defensa nacional y los regímenes obligatorios de seguridad social.", &[361]),
        entry("Provisión de instrucción y formación en diversos niveles y especialidades, desde la educación infantil hasta la universitaria y la formación continua.", &[363]),
        entry("Servicios de atención médica, hospitalaria, dental y de enfermería, así como actividades de asistencia social sin alojamiento (trabajo social, servicios de guardería).", &[365]),
        entry("Operaciones relacionadas con las artes escénicas, espectáculos, museos, jardines botánicos y zoológicos, parques de atracciones, actividades deportivas y de recreo.", &[369]),
        entry("Categoría miscelánea que incluye servicios personales (peluquerías, salones de belleza), servicios de lavandería, reparaciones de ordenadores y artículos personales, y otras actividades no clasificadas en otros apartados.", &[374]),
        entry("Actividades realizadas por hogares particulares que emplean personal doméstico para el servicio propio, y la producción de bienes y servicios por los hogares para su consumo exclusivo.", &[378]),
        entry("Actividades de organismos internacionales, embajadas, misiones diplomáticas y otros cuerpos extraterritoriales.", &[381]),
    ],
};

pub const INSTRUMENTS: Taxonomy = Taxonomy {
    name: "instrument",
    entries: &[
        entry("SUBVENCIÓN Y ENTREGA DINERARIA SIN CONTRAPRESTACIÓN. Ayuda económica no reembolsable, también conocida como subvención directa, que se otorga sin esperar devolución ni contraprestación. Se vincula a un objetivo concreto como la innovación, el empleo, o el desarrollo regional. Palabras clave: subvención, ayuda directa, entrega dineraria, no reembolsable, sin contraprestación.", &[1]),
        entry("PRÉSTAMO. Instrumento financiero basado en la entrega de capital reembolsable, generalmente sujeto a intereses y plazos de amortización. Puede tener tipo de interés fijo o variable. Frecuente en programas de financiación para inversiones, digitalización o crecimiento empresarial. Palabras clave: préstamo, devolución, intereses, amortización, financiación reembolsable.", &[2]),
        entry("GARANTÍA. Instrumento de aval, fianza o respaldo financiero proporcionado por una entidad para asegurar el cumplimiento de obligaciones o facilitar el acceso a otras fuentes de financiación. Se usa mucho en licitaciones, proyectos de inversión o emprendimiento. Palabras clave: garantía, aval, respaldo, fianza, seguridad financiera.", &[4]),
        entry("VENTAJA FISCAL. Conjunto de incentivos en materia de impuestos o tributos, como deducciones fiscales, bonificaciones, exenciones o aplazamientos. Permiten a empresas o autónomos reducir su carga fiscal. Muy frecuente en políticas de I+D+i o empleo. Palabras clave: ventaja fiscal, deducción, bonificación, exención, ahorro tributario.", &[5]),
        entry("APORTACIÓN DE FINANCIACIÓN DE RIESGO. Modalidad de inversión que implica asumir riesgo empresarial, como el capital riesgo o el venture capital. El apoyo se hace mediante la entrada al capital social o financiación subordinada. Muy usada en startups o proyectos con alto potencial de crecimiento. Palabras clave: capital riesgo, inversión, venture capital, participación, financiación de riesgo.", &[6]),
        entry("OTROS INSTRUMENTOS DE AYUDA. Categoría abierta para apoyos no monetarios directos como consultoría gratuita, asesoramiento técnico, acceso a espacios físicos o servicios sin coste. Incluye cualquier forma de ayuda que no sea préstamo, subvención, garantía, fiscalidad o capital. Palabras clave: asesoramiento, consultoría, cesión, soporte no financiero, apoyo institucional.", &[7]),
    ],
};

pub const PURPOSES: Taxonomy = Taxonomy {
    name: "purpose",
    entries: &[
        entry("ACCESO A LA VIVIENDA Y FOMENTO DE LA EDIFICACIÓN. Ayudas y programas dirigidos a facilitar la adquisición, el alquiler o la rehabilitación de viviendas, así como al impulso y financiación de proyectos de construcción de nuevas edificaciones. Palabras clave: vivienda, alquiler, hipoteca, rehabilitación, edificación.", &[8]),
        entry("AGRICULTURA, PESCA Y ALIMENTACIÓN. Programas de apoyo a la agricultura, la ganadería, la silvicultura, la pesca y todas las actividades relacionadas con la producción, transformación y comercialización de alimentos. Palabras clave: agroalimentario, ganadería, agricultura, pesca, alimentos.", &[12]),
        entry("COMERCIO, TURISMO Y PYMES. Iniciativas y fondos destinados a impulsar el comercio minorista y mayorista, la promoción turística de destinos y servicios, y el apoyo específico a Pequeñas y Medianas Empresas (PYMES) en su desarrollo y crecimiento. Palabras clave: comercio, turismo, pyme, hostelería, marketing comercial.", &[14]),
        entry("COOPERACIÓN INTERNACIONAL PARA EL DESARROLLO Y CULTURAL. Proyectos y fondos orientados a la colaboración con otros países para su desarrollo económico y social, así como al fomento y difusión de la cultura a nivel internacional. Palabras clave: cooperación internacional, ayuda exterior, desarrollo global, cultura exterior, relaciones internacionales.", &[20]),
        entry("CULTURA. Ayudas y programas para la promoción, conservación y difusión del patrimonio cultural, las artes escénicas, las bellas artes, el cine, la música, la literatura y otras manifestaciones culturales. Palabras clave: patrimonio, arte, cine, música, literatura.", &[11]),
        entry("DEFENSA. Programas y presupuestos destinados a la seguridad y defensa nacional, incluyendo el equipamiento militar, la formación de personal y las operaciones de seguridad y protección. Palabras clave: defensa, militar, ejército, armamento, estrategia nacional.", &[2]),
        entry("DESEMPLEO. Ayudas y prestaciones dirigidas a personas en situación de desempleo, incluyendo subsidios, prestaciones por desempleo y programas de reinserción laboral. Palabras clave: paro, subsidio, prestación por desempleo, reinserción, desempleado.", &[7]),
        entry("EDUCACION. Fondos y programas dedicados a la financiación de centros educativos, becas para estudiantes, formación profesional, educación superior y todas las actividades relacionadas con la enseñanza y el aprendizaje. Palabras clave: educación, beca, escolar, universidad, formación académica.", &[10]),
        entry("FOMENTO DEL EMPLEO. Iniciativas y ayudas para la creación de empleo, el fomento del autoempleo, la formación y cualificación profesional, y el apoyo a la contratación de colectivos específicos. Palabras clave: contratación, autoempleo, inserción laboral, empleabilidad, creación de empleo.", &[6]),
        entry("INDUSTRIA Y ENERGÍA. Ayudas y programas para el desarrollo de la industria, la innovación tecnológica en el sector industrial, la eficiencia energética y el fomento de fuentes de energía sostenibles. Palabras clave: industria, energía, eficiencia energética, fábrica, energía renovable.", &[13]),
        entry("INFORMACIÓN NO DISPONIBLE. Esta categoría se utiliza cuando no se dispone de información específica o suficiente para clasificar la ayuda en ninguna de las otras áreas definidas. Palabras clave: desconocido, sin categorizar, información ausente, no disponible.", &[21]),
        entry("INFRAESTRUCTURAS. Inversiones y proyectos para el desarrollo y mantenimiento de infraestructuras de transporte (carreteras, ferrocarriles, puertos, aeropuertos), energéticas, hidráulicas o de telecomunicaciones. Palabras clave: carreteras, infraestructuras, transporte, puertos, telecomunicaciones.", &[16]),
        entry("INVESTIGACIÓN, DESARROLLO E INNOVACIÓN. Apoyo a proyectos de investigación científica, desarrollo tecnológico y actividades de innovación en todos los sectores, buscando el avance del conocimiento y la aplicación de nuevas tecnologías. Palabras clave: I+D, innovación, ciencia, desarrollo tecnológico, investigación aplicada.", &[17]),
        entry("JUSTICIA. Programas y fondos relacionados con la administración de justicia, los sistemas judiciales, la asistencia legal y los servicios penitenciarios. Palabras clave: justicia, tribunales, legal, juzgado, penitenciario.", &[1]),
        entry("OTRAS ACTUACIONES DE CARÁCTER ECONÓMICO. Categoría amplia que engloba subvenciones y ayudas no clasificables en otros sectores específicos, pero que tienen un claro impacto o finalidad económica, como apoyo a empresas en general, desarrollo regional, etc. Palabras clave: subvenciones, incentivo empresarial, desarrollo economico, crecimiento.", &[18]),
        entry("OTRAS PRESTACIONES ECONÓMICAS. Incluye diversas ayudas económicas que no se ajustan a las categorías de empleo, vivienda o dependencia, como ayudas a familias, a la natalidad, o prestaciones económicas por situaciones especiales. Palabras clave: natalidad, familia numerosa, prestación especial, ayuda puntual, situación excepcional.", &[4]),
        entry("SANIDAD. Programas y fondos destinados a la atención sanitaria, la prevención de enfermedades, la salud pública, la investigación médica y la mejora de los servicios de salud. Palabras clave: salud, sanidad, atención médica, prevención, sistema sanitario.", &[9]),
        entry("SEGURIDAD CIUDADANA E INSTITUCIONES PENITENCIARIAS. Ayudas y presupuestos para la seguridad pública, las fuerzas y cuerpos de seguridad, la prevención del delito, y la gestión y funcionamiento de las instituciones penitenciarias. Palabras clave: seguridad, policía, vigilancia, delincuencia, prisión.", &[3]),
        entry("SERVICIOS SOCIALES Y PROMOCIÓN SOCIAL. Programas y prestaciones dirigidos a colectivos vulnerables, promoción de la inclusión social, atención a la dependencia, servicios para personas mayores o con discapacidad, y otras iniciativas de bienestar social. Palabras clave: servicios sociales, dependencia, inclusión, personas mayores, discapacidad.", &[5]),
        entry("SIN INFORMACION ESPECIFICA. Similar a 'INFORMACIÓN NO DISPONIBLE', esta categoría se usa cuando la temática de la subvención no está claramente definida o especificada dentro de las categorías preestablecidas. Palabras clave: sin información, sin especificar, indeterminado, categoría desconocida.", &[19]),
        entry("SUBVENCIONES AL TRANSPORTE. Ayudas específicas destinadas a fomentar el uso del transporte público, la mejora de infraestructuras de transporte o la subvención de billetes o abonos para usuarios. Palabras clave: transporte público, billete subvencionado, movilidad urbana, bono transporte, accesibilidad vial.", &[15]),
    ],
};

/// Function words and query filler dropped from the description keywords.
/// Multi-word phrases are kept from the source list; they never match a single
/// token and are harmless.
pub const STOP_WORDS: &[&str] = &[
    "a", "al", "algo", "algunas", "algunos", "ante", "antes", "como", "con", "contra", "cual",
    "cuando", "de", "del", "desde", "donde", "durante", "e", "el", "ella", "ellas", "ellos", "en",
    "entre", "es", "esa", "esas", "ese", "eso", "esos", "esta", "estas", "este", "esto", "estos",
    "existen", "hacia", "hasta", "incluso", "la", "las", "le", "les", "lo", "los", "muy", "ni",
    "o", "otro", "otras", "otros", "para", "pero", "por", "que", "quien", "quienes", "se", "sea",
    "sean", "si", "sido", "sin", "sino", "solo", "su", "sus", "tal", "también", "tan", "te",
    "tener", "tienen", "todo", "todos", "tras", "un", "una", "uno", "unos", "usted", "ustedes",
    "y", "ya", "yo", "acerca", "además", "apenas", "así", "aún", "aunque", "casi", "cierta",
    "ciertas", "cierto", "ciertos", "cómo", "cualquier", "cuándo", "dado", "debido", "demás",
    "fin", "fue", "fueron", "fuesen", "fuesemos", "hubiera", "hubieramos", "hubiesen",
    "hubiesemos", "hubo", "igualmente", "más", "mismo", "muchas", "muchos", "nadie", "ninguna",
    "ninguno", "nunca", "poco", "pocas", "pocos", "pueden", "puedo", "quiero", "respecto",
    "saber", "ser", "siempre", "sólo", "solos", "somos", "suele", "tampoco", "tengo", "tienes",
    "todas", "va", "vamos", "van", "vez", "veces", "vía", "voy", "ayudame", "ayúdame", "buscar",
    "encontrar", "referentes", "sobre", "relacionado", "relacionados", "me", "gustaría", "hay",
    "quieres", "necesito", "podría", "podríamos", "favor", "información", "dónde", "cuál",
    "cuáles", "quién", "quiénes", "por qué", "para qué", "qué", "mis", "mi", "tu", "tus",
    "nuestro", "nuestra", "nuestros", "nuestras", "vuestro", "vuestra", "vuestros", "vuestras",
    "suya", "suyos", "suyas", "mío", "mía", "míos", "mías", "tuyo", "tuya", "tuyos", "tuyas",
    "misma", "mismos", "mismas", "cada", "poca", "mucho", "mucha", "bastante", "demasiado",
    "toda", "varios", "varias", "ambos", "ambas", "sendos", "sendas", "otra", "tanto", "tanta",
    "tantos", "tantas", "cuan", "cuanto", "cuanta", "cuantos", "cuantas", "menos", "mejor",
    "peor", "después", "mientras", "jamás", "todavía", "bien", "mal", "alto", "bajo", "lejos",
    "cerca", "dentro", "fuera", "arriba", "abajo", "delante", "detrás", "aquí", "allí", "ahí",
    "entonces", "luego", "asimismo", "no", "sí", "quizás", "quizá", "acaso", "probablemente",
    "posiblemente", "ciertamente", "efectivamente", "en efecto", "por supuesto", "claro",
    "hacia dónde", "de dónde", "a dónde", "con quién", "de quién", "para quién", "por quién",
    "entre quiénes", "contra quién", "sin quién", "a pesar de", "a fin de", "con el fin de",
    "a través de", "en cuanto a", "en medio de", "en vez de", "por parte de", "a lo largo de",
    "alrededor de", "debajo de", "encima de", "frente a", "junto a", "a causa de",
    "con motivo de", "por culpa de", "debido a", "gracias a", "para con", "sin embargo",
    "no obstante", "por consiguiente", "por lo tanto", "así que", "de modo que",
    "de manera que", "en resumen", "en conclusión", "finalmente", "en primer lugar",
    "en segundo lugar", "por último", "en general", "en particular", "por ejemplo", "es decir",
    "o sea", "en otras palabras", "por otra parte", "por un lado", "por otro lado", "en cambio",
    "al contrario", "a diferencia de", "mientras que", "por más que", "si bien", "para que",
    "a fin de que", "con el objeto de que", "con el fin de que", "con la finalidad de que",
    "tan pronto como", "en cuanto", "no bien", "mientras tanto", "hasta que", "desde que",
    "antes de que", "después de que", "para cuándo", "cuánto", "cuánta", "cuántos", "cuántas",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn region_names_are_unique_and_lowercase() {
        let mut seen = HashSet::new();
        for (name, _) in REGIONS {
            assert!(seen.insert(*name), "duplicate region {name}");
            assert_eq!(*name, name.to_lowercase());
        }
    }

    #[test]
    fn repeated_region_keys_keep_the_later_id() {
        let lookup = |wanted: &str| REGIONS.iter().find(|(name, _)| *name == wanted).map(|(_, id)| *id);
        assert_eq!(lookup("cantabria"), Some(10));
        assert_eq!(lookup("la rioja"), Some(19));
        assert_eq!(lookup("comunidad de madrid"), Some(26));
    }

    #[test]
    fn semantic_tables_have_ids() {
        for table in [BENEFICIARIES, ACTIVITIES, INSTRUMENTS, PURPOSES] {
            assert!(!table.entries.is_empty(), "{} is empty", table.name);
            assert!(table.entries.iter().all(|entry| !entry.ids.is_empty()));
            assert_eq!(table.descriptions().len(), table.entries.len());
        }
    }
}
