// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table (SQLite ou PostgreSQL) avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (propriétaires des données)
//   - category : Catégories de produits/services
//   - product : Produits/services (prix final et profit calculés à la lecture)
//   - sale : Ventes (photo du coût et du prix au moment de la vente)
//   - expense : Dépenses (statut payé/en attente/en retard dérivé)
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Toutes les tables métier portent un user_id
//   - Aucune relation ne traverse deux utilisateurs (vérifié dans les services)
//   - Les tables sont créées au démarrage depuis les entités (db::create_tables)
//
// ============================================================================

pub mod health;
pub mod users;
pub mod category;
pub mod product;
pub mod sale;
pub mod expense;
pub mod dto;
